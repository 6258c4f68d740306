//! A lex -> parse -> evaluate driver that is generic over the three stages.

use std::{
    collections::VecDeque,
    fmt::Display,
    io::{self, BufRead, Write},
};

use thiserror::Error;
use tracing::debug;

use crate::repl::Repl;

pub trait Lexer {
    type Token;
    type Error: Display;
    /// A fresh token stream over one line. Items are pulled lazily.
    fn lex<'i>(&self, line: &'i str)
        -> impl Iterator<Item = Result<Self::Token, Self::Error>> + 'i;
}

pub trait Parser<Token> {
    type Term;
    type Error: Display;
    fn parse(&self, tokens: VecDeque<Token>) -> Result<Self::Term, Self::Error>;
}

pub trait Evaluator<Term> {
    type Context;
    type Value: Display;
    type Error: Display;
    fn evaluate(&self, term: Term, context: &Self::Context) -> Result<Self::Value, Self::Error>;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Stage {
    Lex,
    Parse,
    Evaluation,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Lex => "lex",
            Stage::Parse => "parse",
            Stage::Evaluation => "evaluation",
        })
    }
}

/// The stage that rejected a line, with its message.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[error("{stage} error: {message}")]
pub struct Failure {
    pub stage: Stage,
    pub message: String,
}

impl Failure {
    fn new(stage: Stage, error: impl Display) -> Self {
        Self {
            stage,
            message: error.to_string(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Exit,
    Help,
}

const COMMANDS: [(&str, Command); 2] = [("exit", Command::Exit), ("help", Command::Help)];

fn lookup_command(line: &str) -> Option<Command> {
    COMMANDS
        .iter()
        .find_map(|(name, command)| (*name == line).then(|| *command))
}

pub struct Pipeline<L, P, E>
where
    L: Lexer,
    P: Parser<L::Token>,
    E: Evaluator<P::Term>,
{
    lexer: L,
    parser: P,
    evaluator: E,
    context: E::Context,
    prompt: String,
    welcome: String,
    goodbye: String,
    help: String,
    exit: bool,
}

impl<L, P, E> Pipeline<L, P, E>
where
    L: Lexer,
    P: Parser<L::Token>,
    E: Evaluator<P::Term>,
{
    pub fn new(lexer: L, parser: P, evaluator: E, context: E::Context) -> Self {
        Self {
            lexer,
            parser,
            evaluator,
            context,
            prompt: "> ".to_string(),
            welcome: "Welcome".to_string(),
            goodbye: "Goodbye".to_string(),
            help: "Type a term to evaluate it. `help` shows this message, `exit` quits.".to_string(),
            exit: false,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_welcome(mut self, welcome: impl Into<String>) -> Self {
        self.welcome = welcome.into();
        self
    }

    pub fn with_goodbye(mut self, goodbye: impl Into<String>) -> Self {
        self.goodbye = goodbye.into();
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn context(&self) -> &E::Context {
        &self.context
    }

    pub fn is_finished(&self) -> bool {
        self.exit
    }

    /// Runs the three stages on one line, stopping at the first failing stage.
    pub fn interpret(&self, line: &str) -> Result<E::Value, Failure> {
        let tokens = self
            .lexer
            .lex(line)
            .collect::<Result<VecDeque<_>, _>>()
            .map_err(|e| Failure::new(Stage::Lex, e))?;
        debug!(tokens = tokens.len(), "lexed line");
        let term = self
            .parser
            .parse(tokens)
            .map_err(|e| Failure::new(Stage::Parse, e))?;
        debug!("parsed line");
        self.evaluator
            .evaluate(term, &self.context)
            .map_err(|e| Failure::new(Stage::Evaluation, e))
    }

    fn run_command(&mut self, command: Command) -> Option<String> {
        debug!(?command, "built-in command");
        match command {
            Command::Exit => {
                self.exit = true;
                None
            }
            Command::Help => Some(self.help.clone()),
        }
    }

    /// Handles one input line and returns the text to print, if any.
    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        if let Some(command) = lookup_command(line) {
            return self.run_command(command);
        }
        if line.trim().is_empty() {
            return None;
        }
        Some(match self.interpret(line) {
            Ok(value) => value.to_string(),
            Err(failure) => failure.to_string(),
        })
    }

    /// Drives a whole session over non-interactive input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> io::Result<()> {
        writeln!(out, "{}", self.welcome)?;
        for line in input.lines() {
            if let Some(reply) = self.handle_line(&line?) {
                writeln!(out, "{reply}")?;
            }
            if self.exit {
                break;
            }
        }
        writeln!(out, "{}", self.goodbye)?;
        Ok(())
    }
}

impl<L, P, E> Repl for Pipeline<L, P, E>
where
    L: Lexer,
    P: Parser<L::Token>,
    E: Evaluator<P::Term>,
{
    type Error = std::convert::Infallible;

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn welcome(&self) -> &str {
        &self.welcome
    }

    fn goodbye(&self) -> &str {
        &self.goodbye
    }

    fn is_finished(&self) -> bool {
        self.exit
    }

    fn evaluate(&mut self, input: String) -> Result<(), Self::Error> {
        if let Some(reply) = self.handle_line(&input) {
            println!("{reply}");
        }
        Ok(())
    }
}
