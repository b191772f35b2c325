/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes four top-level command modules:

- `chat`    - Interactive chat session (REPL)
- `code`    - One-shot code generation
- `history` - List persisted turns and reconstruct threads
- `auth`    - Sign-in and sign-out flows

The handlers wire configuration, storage, the provider, and the session
controller together and leave the conversation logic to the library
modules.
*/

pub mod auth;
pub mod chat;
pub mod code;
pub mod history;
