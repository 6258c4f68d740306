use std::path::Path;

use rustyline::{error::ReadlineError, Editor};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum Error<E> {
    #[error(transparent)]
    Readline(ReadlineError),
    #[error("Eval failed: {0:?}")]
    EvalError(E),
}

pub trait Repl {
    type Error: std::fmt::Debug;
    fn prompt(&self) -> &str {
        ">> "
    }
    fn welcome(&self) -> &str;
    fn goodbye(&self) -> &str {
        "Bye!"
    }
    /// Checked before every prompt; lets a command end the session.
    fn is_finished(&self) -> bool {
        false
    }
    fn evaluate(&mut self, input: String) -> Result<(), Self::Error>;
}

pub fn start_repl<R: Repl>(mut repl: R, history: Option<&Path>) -> Result<(), Error<R::Error>> {
    let mut editor = Editor::<()>::new();
    if let Some(history) = history {
        if history.exists() {
            if let Err(e) = editor.load_history(history) {
                warn!(history = %history.display(), "could not load history: {e}");
            }
        }
    }
    println!("{}", repl.welcome());
    loop {
        if repl.is_finished() {
            println!("{}", repl.goodbye());
            break Ok(());
        }
        match editor.readline(repl.prompt()) {
            Ok(line) => {
                editor.add_history_entry(line.as_str());
                repl.evaluate(line).map_err(Error::EvalError)?;
                if let Some(history) = history {
                    editor.save_history(history).map_err(Error::Readline)?;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("{}", repl.goodbye());
                break Ok(());
            }
            Err(e) => break Err(Error::Readline(e)),
        }
    }
}
