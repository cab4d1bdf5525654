// src/session/memory.rs
use crate::models::Exchange;
use std::collections::VecDeque;

/// Sliding window over the most recent exchanges of one session.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    window: usize,
    exchanges: VecDeque<Exchange>,
}

impl ConversationMemory {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            exchanges: VecDeque::with_capacity(window),
        }
    }

    /// The assistant side is stored as the SQL it generated, not the rendered HTML.
    pub fn record(&mut self, user_message: &str, sql: &str) {
        self.exchanges.push_back(Exchange {
            user_message: user_message.to_string(),
            ai_message: format!("Generated SQL: `{}`", sql),
        });
        while self.exchanges.len() > self.window {
            self.exchanges.pop_front();
        }
    }

    pub fn exchanges(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter()
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// History text for the prompt. Only the latest exchange is spelled out;
    /// older ones are still kept for the window.
    pub fn format_recent(&self) -> String {
        match self.exchanges.back() {
            Some(last) => format!(
                "Previous User Question: {}\nPrevious AI Response (contains SQL): {}",
                last.user_message, last.ai_message
            ),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_drops_oldest() {
        let mut memory = ConversationMemory::new(4);
        for i in 0..6 {
            memory.record(&format!("question {}", i), &format!("SELECT {}", i));
        }
        assert_eq!(memory.len(), 4);
        let first = memory.exchanges().next().unwrap();
        assert_eq!(first.user_message, "question 2");
        assert_eq!(first.ai_message, "Generated SQL: `SELECT 2`");
    }

    #[test]
    fn test_format_recent() {
        let mut memory = ConversationMemory::new(4);
        assert_eq!(memory.format_recent(), "");
        memory.record("how many employees?", "SELECT COUNT(*) FROM employees");
        memory.record("and in DP002?", "SELECT COUNT(*) FROM employees WHERE department = 'DP002'");
        assert_eq!(
            memory.format_recent(),
            "Previous User Question: and in DP002?\nPrevious AI Response (contains SQL): Generated SQL: `SELECT COUNT(*) FROM employees WHERE department = 'DP002'`"
        );
    }
}
