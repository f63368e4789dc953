//! "Oneshot" invocation of the echo handler.
//!
//! Reads one Lambda event from the file named on the command line (or from
//! stdin, given `-`), runs it through the echo handler, and prints the reply
//! event. Useful for checking what a captured event will look like to a
//! handler without deploying anything.

use anyhow::{anyhow, Context, Result};
use std::{
    env, fs,
    io::{self, Read, Write},
};

fn main() -> Result<()> {
    let mut args = env::args();
    args.next(); // skip argv[0]

    let source = args
        .next()
        .ok_or_else(|| anyhow!("first argument should be a JSON event file, or `-` for stdin"))?;

    let payload = if source == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read event from stdin")?;
        buf
    } else {
        fs::read(&source).with_context(|| format!("failed to read event file `{source}`"))?
    };

    lambda_chop::init_tracing();

    let reply = lambda_chop::wrap(lambda_chop::echo).invoke(&payload)?;

    let mut out = io::stdout().lock();
    out.write_all(&reply)?;
    writeln!(out)?;
    Ok(())
}
