use std::io::{self, BufRead, Write};

use ndaflow_agent::AgentRuntime;
use tokio::runtime::Runtime;
use tracing::info;

use super::{open_session, CommandResult, EXIT_RUNTIME};

pub fn ask(text: &str) -> CommandResult {
    let session = match open_session("ask") {
        Ok(session) => session,
        Err(failure) => return failure,
    };

    let reply = session.runtime.block_on(session.application.runtime.handle_message(text));
    CommandResult::success("ask", reply)
}

pub fn run() -> CommandResult {
    let session = match open_session("chat") {
        Ok(session) => session,
        Err(failure) => return failure,
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    match converse(&session.application.runtime, &session.runtime, stdin.lock(), stdout.lock()) {
        Ok(turns) => {
            info!(event_name = "cli.chat.finished", turns, "chat session ended");
            CommandResult { exit_code: 0, output: String::new() }
        }
        Err(error) => CommandResult::failure(
            "chat",
            "io",
            format!("chat session failed: {error}"),
            EXIT_RUNTIME,
        ),
    }
}

/// Reads requests line by line until an exit word or end of input. Blank
/// lines are skipped. Returns the number of handled turns.
pub fn converse<R, W>(
    agent: &AgentRuntime,
    runtime: &Runtime,
    input: R,
    mut output: W,
) -> io::Result<usize>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "{} - {}", agent.profile().name, agent.profile().description)?;
    writeln!(output, "Type `help` for examples, `quit` to leave.")?;

    let mut turns = 0;
    write!(output, "> ")?;
    output.flush()?;
    for line in input.lines() {
        let line = line?;
        let text = line.trim();
        if AgentRuntime::is_exit_command(text) {
            break;
        }
        if !text.is_empty() {
            let reply = runtime.block_on(agent.handle_message(text));
            writeln!(output, "{reply}")?;
            turns += 1;
        }
        write!(output, "> ")?;
        output.flush()?;
    }

    writeln!(output, "Goodbye.")?;
    Ok(turns)
}
