use std::{
    io::{self, IsTerminal},
    path::PathBuf,
    thread,
};

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;
use util::{pipeline::Pipeline, repl};

use lambda::{context::Context, eval::Reducer, lexer::LambdaLexer, parser::LambdaParser};

const HELP: &str = r#"
term        -- reduce the term in normal order and print its value
help        -- show this message
exit        -- leave the REPL

Terms:  x   \x.t   t t   (t)
Names defined in the prelude (true, false, and, pair, first, second,
zero, succ, plus, times) are expanded when they occur free.
"#;

/// Untyped lambda calculus REPL with normal-order reduction.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Definitions file (`name = term` per line) used instead of the bundled prelude.
    #[arg(short, long, conflicts_with = "no_prelude")]
    prelude: Option<PathBuf>,

    /// Start without any definitions.
    #[arg(long)]
    no_prelude: bool,

    /// Give up on a term after this many reduction steps.
    #[arg(short, long)]
    fuel: Option<usize>,

    /// Print values folded back into prelude names and numerals.
    #[arg(short, long)]
    contract: bool,

    /// History file for the interactive line editor.
    #[arg(long)]
    history: Option<PathBuf>,
}

/// Reduction, substitution and parsing recurse once per nesting level.
const STACK_SIZE: usize = 256 * 1024 * 1024;

/// Runs `f` on a thread with a stack large enough for deeply nested terms.
fn on_large_stack<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name("interpreter".to_string())
        .stack_size(STACK_SIZE)
        .spawn(f)?
        .join()
        .map_err(|_| anyhow!("interpreter thread panicked"))?
}

type LambdaPipeline = Pipeline<LambdaLexer, LambdaParser, Reducer>;

fn build_pipeline(context: Context, reducer: Reducer) -> LambdaPipeline {
    Pipeline::new(LambdaLexer, LambdaParser, reducer, context)
        .with_prompt(">> ")
        .with_welcome("Hi, this is an untyped lambda calculus REPL. Type help to show help")
        .with_goodbye("Bye!")
        .with_help(HELP.trim())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    on_large_stack(run)
}

fn run() -> Result<()> {
    let args = Args::parse();
    let context = if args.no_prelude {
        Context::new()
    } else if let Some(path) = &args.prelude {
        Context::load(path)?
    } else {
        Context::prelude()?
    };
    info!(definitions = context.len(), fuel = ?args.fuel, "starting");

    let reducer = Reducer {
        fuel: args.fuel,
        contract: args.contract,
    };
    let mut pipeline = build_pipeline(context, reducer);
    if io::stdin().is_terminal() {
        repl::start_repl(pipeline, args.history.as_deref())?;
    } else {
        pipeline.run(io::stdin().lock(), io::stdout().lock())?;
    }
    Ok(())
}
