use super::{attach_session_cookie, session_id_or_new};
use crate::AppState;
use axum::{
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use std::sync::Arc;

pub fn ui_routes() -> Router {
    Router::new().route("/", get(chat_interface))
}

/// Serves the chat page. Loading it starts over: the session forgets its
/// database and conversation.
pub async fn chat_interface(Extension(state): Extension<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (session_id, is_new) = session_id_or_new(&headers);
    state.sessions.reset(&session_id).await;
    tracing::debug!("Session {} reset by page load", session_id);

    let mut response = Html(CHAT_PAGE).into_response();
    if is_new {
        attach_session_cookie(&mut response, &session_id);
    }
    response
}

const CHAT_PAGE: &str = r###"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>QueryChat - Ask your database</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            min-height: 100vh;
            display: flex;
            gap: 20px;
            padding: 20px;
        }

        body.dark-mode {
            background: linear-gradient(135deg, #1a1a2e 0%, #16213e 50%, #0f1419 100%);
            color: #e8e8e8;
            --panel: rgba(26, 26, 46, 0.9);
            --field: #0f1419;
            --border: #334;
            --user: #2a2a5e;
            --bot: #1f2937;
            --muted: #aab;
        }

        body.light-mode {
            background: linear-gradient(135deg, #f5f7fa 0%, #e4e9f2 100%);
            color: #1f2330;
            --panel: rgba(255, 255, 255, 0.95);
            --field: #ffffff;
            --border: #c8cfdc;
            --user: #dfe4ff;
            --bot: #f0f2f7;
            --muted: #556;
        }

        .panel {
            background: var(--panel);
            border: 1px solid var(--border);
            border-radius: 10px;
            padding: 20px;
        }

        .connect-panel { width: 320px; flex-shrink: 0; }
        .chat-panel { flex: 1; display: flex; flex-direction: column; }

        .panel-header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 1rem; }
        h1 { font-size: 1.4rem; }
        label { display: block; font-size: 0.85rem; margin: 0.6rem 0 0.2rem; color: var(--muted); }
        .theme-toggle { display: flex; align-items: center; gap: 0.4rem; margin: 0; }
        .theme-toggle input { width: auto; }

        input, select {
            width: 100%;
            padding: 0.5rem;
            border-radius: 5px;
            border: 1px solid var(--border);
            background: var(--field);
            color: inherit;
        }

        input:disabled { opacity: 0.5; }

        button {
            margin-top: 1rem;
            padding: 0.6rem 1rem;
            border: none;
            border-radius: 5px;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            color: white;
            font-weight: bold;
            cursor: pointer;
        }

        button:disabled { opacity: 0.5; cursor: not-allowed; }

        .field { position: relative; }
        .suggestions {
            display: none;
            position: absolute;
            left: 0;
            right: 0;
            z-index: 10;
            max-height: 180px;
            overflow-y: auto;
            background: var(--field);
            border: 1px solid var(--border);
            border-radius: 0 0 5px 5px;
        }
        .suggestions div { padding: 0.4rem 0.5rem; cursor: pointer; }
        .suggestions div:hover { background: var(--user); }
        .chat-input .suggestions { bottom: 100%; top: auto; border-radius: 5px 5px 0 0; }

        #connect-status { margin-top: 1rem; font-size: 0.9rem; }
        .ok { color: #4caf50; }
        .err { color: #ff6b6b; }

        #messages { flex: 1; overflow-y: auto; margin-bottom: 1rem; }
        .message { position: relative; margin: 0.6rem 0; padding: 0.7rem 1rem; border-radius: 8px; max-width: 90%; }
        .user { background: var(--user); margin-left: auto; }
        .bot { background: var(--bot); }
        .bot.error { border-left: 3px solid #ff6b6b; }
        #typing-indicator { letter-spacing: 0.3rem; color: var(--muted); }

        .copy-btn {
            margin: 0.4rem 0 0;
            padding: 0.15rem 0.5rem;
            font-size: 0.75rem;
            font-weight: normal;
            background: transparent;
            border: 1px solid var(--border);
            color: var(--muted);
        }

        .table-container { overflow-x: auto; margin-top: 0.5rem; }
        table { border-collapse: collapse; width: 100%; font-size: 0.9rem; }
        th, td { border: 1px solid var(--border); padding: 0.35rem 0.6rem; text-align: left; }
        th { background: var(--user); }

        .chat-input { display: flex; gap: 10px; }
        .chat-input .field { flex: 1; }
        .chat-input button { margin-top: 0; }
    </style>
</head>
<body class="dark-mode">
    <div class="panel connect-panel">
        <div class="panel-header">
            <h1>Database</h1>
            <label class="theme-toggle"><input type="checkbox" id="dark-mode-checkbox" checked> Dark</label>
        </div>
        <form id="connect-form">
            <label for="db_type">Type</label>
            <select id="db_type" name="db_type">
                <option value="postgresql">PostgreSQL</option>
                <option value="mysql">MySQL</option>
                <option value="sqlite">SQLite</option>
            </select>
            <label for="host">Host</label>
            <input id="host" name="host" value="localhost">
            <label for="port">Port</label>
            <input id="port" name="port" value="5432">
            <label for="username">Username</label>
            <div class="field">
                <input id="username" name="username" autocomplete="off">
                <div class="suggestions" id="username-suggestions"></div>
            </div>
            <label for="password">Password</label>
            <input id="password" name="password" type="password">
            <label for="db_name">Database</label>
            <div class="field">
                <input id="db_name" name="db_name" placeholder="Database Name" autocomplete="off">
                <div class="suggestions" id="dbname-suggestions"></div>
            </div>
            <button type="submit">Connect</button>
        </form>
        <div id="connect-status"></div>
    </div>

    <div class="panel chat-panel">
        <div class="panel-header"><h1>Ask a question</h1></div>
        <div id="messages"></div>
        <form id="chat-form" class="chat-input">
            <div class="field">
                <input id="message" placeholder="Connect to a database first" autocomplete="off" disabled>
                <div class="suggestions" id="query-suggestions"></div>
            </div>
            <button type="submit" id="send" disabled>Send</button>
        </form>
    </div>

    <script>
        const defaultPorts = { postgresql: '5432', mysql: '3306', sqlite: '' };
        const MAX_RECENT = 20;
        const messages = document.getElementById('messages');
        const status = document.getElementById('connect-status');
        const dbType = document.getElementById('db_type');
        const host = document.getElementById('host');
        const port = document.getElementById('port');
        const dbName = document.getElementById('db_name');
        const username = document.getElementById('username');
        const messageInput = document.getElementById('message');
        const darkMode = document.getElementById('dark-mode-checkbox');

        darkMode.addEventListener('change', () => {
            document.body.classList.toggle('light-mode', !darkMode.checked);
            document.body.classList.toggle('dark-mode', darkMode.checked);
        });

        dbType.addEventListener('change', () => {
            const isSqlite = dbType.value === 'sqlite';
            host.value = isSqlite ? '' : 'localhost';
            port.value = defaultPorts[dbType.value];
            host.disabled = isSqlite;
            port.disabled = isSqlite;
            dbName.placeholder = isSqlite ? 'Database File Path' : 'Database Name';
        });

        function loadRecent(key) {
            try {
                return JSON.parse(localStorage.getItem(key)) || [];
            } catch (err) {
                return [];
            }
        }

        function saveRecent(key, value) {
            if (!value) return;
            const items = loadRecent(key).filter(item => item !== value);
            items.unshift(value);
            localStorage.setItem(key, JSON.stringify(items.slice(0, MAX_RECENT)));
        }

        function setupSuggestions(input, box, key) {
            const show = () => {
                const filter = input.value.toLowerCase();
                const items = loadRecent(key).filter(item => item.toLowerCase().includes(filter));
                box.innerHTML = '';
                for (const item of items) {
                    const div = document.createElement('div');
                    div.textContent = item;
                    box.appendChild(div);
                }
                box.style.display = items.length > 0 ? 'block' : 'none';
            };

            input.addEventListener('focus', show);
            input.addEventListener('keyup', show);
            box.addEventListener('click', (e) => {
                if (e.target.tagName === 'DIV' && e.target !== box) {
                    input.value = e.target.textContent;
                    box.style.display = 'none';
                    input.focus();
                }
            });
            document.addEventListener('click', (e) => {
                if (!input.contains(e.target) && !box.contains(e.target)) {
                    box.style.display = 'none';
                }
            });
        }

        setupSuggestions(username, document.getElementById('username-suggestions'), 'usernames');
        setupSuggestions(dbName, document.getElementById('dbname-suggestions'), 'dbnames');
        setupSuggestions(messageInput, document.getElementById('query-suggestions'), 'queries');

        function addMessage(html, cls) {
            const div = document.createElement('div');
            div.className = 'message ' + cls;
            const content = document.createElement('div');
            content.innerHTML = html;
            div.appendChild(content);

            const copy = document.createElement('button');
            copy.className = 'copy-btn';
            copy.textContent = 'Copy';
            copy.addEventListener('click', () => {
                navigator.clipboard.writeText(content.innerText).then(() => {
                    copy.textContent = 'Copied!';
                    setTimeout(() => { copy.textContent = 'Copy'; }, 2000);
                });
            });
            div.appendChild(copy);

            messages.appendChild(div);
            messages.scrollTop = messages.scrollHeight;
        }

        function showTyping() {
            if (document.getElementById('typing-indicator')) return;
            const div = document.createElement('div');
            div.id = 'typing-indicator';
            div.className = 'message bot';
            div.textContent = '● ● ●';
            messages.appendChild(div);
            messages.scrollTop = messages.scrollHeight;
        }

        function hideTyping() {
            const div = document.getElementById('typing-indicator');
            if (div) div.remove();
        }

        function escapeText(text) {
            const div = document.createElement('div');
            div.textContent = text;
            return div.innerHTML;
        }

        addMessage("Hello! I'm your data assistant. Connect to a database on the left to begin.", 'bot');

        document.getElementById('connect-form').addEventListener('submit', async (e) => {
            e.preventDefault();
            const body = Object.fromEntries(new FormData(e.target).entries());
            status.textContent = 'Connecting...';
            status.className = '';
            try {
                const res = await fetch('/connect_db', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify(body)
                });
                const data = await res.json();
                if (res.ok) {
                    status.textContent = data.success;
                    status.className = 'ok';
                    messageInput.disabled = false;
                    messageInput.placeholder = 'e.g. Which department has the most employees?';
                    document.getElementById('send').disabled = false;
                    messages.innerHTML = '';
                    addMessage(escapeText(data.success + ' You can start asking questions now.'), 'bot');
                    saveRecent('usernames', body.username);
                    saveRecent('dbnames', body.db_name);
                } else {
                    status.textContent = data.error;
                    status.className = 'err';
                }
            } catch (err) {
                status.textContent = 'Network error: ' + err;
                status.className = 'err';
            }
        });

        document.getElementById('chat-form').addEventListener('submit', async (e) => {
            e.preventDefault();
            const text = messageInput.value.trim();
            if (!text) return;
            messageInput.value = '';
            document.getElementById('query-suggestions').style.display = 'none';
            addMessage(escapeText(text), 'user');
            saveRecent('queries', text);
            showTyping();
            try {
                const res = await fetch('/chat', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify({ message: text })
                });
                const data = await res.json();
                hideTyping();
                if (res.ok) {
                    addMessage(data.response, 'bot');
                } else {
                    addMessage(escapeText(data.error), 'bot error');
                }
            } catch (err) {
                hideTyping();
                addMessage(escapeText('Network error: ' + err), 'bot error');
            }
        });
    </script>
</body>
</html>
"###;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_keeps_recent_entries() {
        assert!(CHAT_PAGE.contains("const MAX_RECENT = 20;"));
        for key in ["'usernames'", "'dbnames'", "'queries'"] {
            assert!(CHAT_PAGE.contains(key), "missing recent list {}", key);
        }
        assert!(CHAT_PAGE.contains("items.slice(0, MAX_RECENT)"));
    }

    #[test]
    fn test_page_shows_typing_indicator_while_waiting() {
        let typing = CHAT_PAGE.find("showTyping();\n").unwrap();
        let fetch = CHAT_PAGE.find("fetch('/chat'").unwrap();
        assert!(typing < fetch);
        assert!(CHAT_PAGE.contains("div.id = 'typing-indicator';"));
        assert_eq!(CHAT_PAGE.matches("hideTyping();").count(), 2);
    }

    #[test]
    fn test_page_disables_host_and_port_for_sqlite() {
        assert!(CHAT_PAGE.contains("host.value = isSqlite ? '' : 'localhost';"));
        assert!(CHAT_PAGE.contains("host.disabled = isSqlite;"));
        assert!(CHAT_PAGE.contains("port.disabled = isSqlite;"));
        assert!(CHAT_PAGE.contains("'Database File Path'"));
    }

    #[test]
    fn test_page_toggles_theme() {
        assert!(CHAT_PAGE.contains("<body class=\"dark-mode\">"));
        assert!(CHAT_PAGE.contains("body.light-mode {"));
        assert!(CHAT_PAGE.contains("classList.toggle('light-mode', !darkMode.checked)"));
    }
}
