use std::io::Write as _;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Args, Parser};
use serde_json::Value;

use wpp_inspect::{dispatch_to, line, read_line_from, render_text, Policy, ValueTag};
use wpp_inspect_cli::{probe_bytes, show, PolicyArgs, StagedValue};

#[derive(Parser, Debug)]
#[command(name = "wpp-inspect")]
#[command(about = "Stage W++ values and run them through the inspection runtime.", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Stage a JSON value under a type tag and print its display text.
    Show(ShowArgs),
    /// Report what the address filter, text probes and renderer make of some bytes.
    Probe(ProbeArgs),
    /// Echo stdin lines through the text renderer until end of input.
    Echo(EchoArgs),
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("which_tag").required(true).args(["tag", "raw_tag"])))]
#[command(group(ArgGroup::new("what").required(true).args(["value", "null"])))]
struct ShowArgs {
    /// i32, i64, f32, f64, bool, text, array or object.
    #[arg(long, value_parser = parse_tag)]
    tag: Option<ValueTag>,

    /// Numeric value tag, passed through as is.
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    raw_tag: Option<i32>,

    /// JSON value to stage.
    #[arg(long, value_name = "JSON")]
    value: Option<String>,

    /// Dispatch a null address instead of a staged value.
    #[arg(long)]
    null: bool,

    #[arg(long)]
    report_json: bool,

    #[command(flatten)]
    policy: PolicyArgs,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["text", "hex"])))]
struct ProbeArgs {
    #[arg(long)]
    text: Option<String>,

    /// Raw bytes as hex, for input that is not valid UTF-8.
    #[arg(long, value_name = "HEX")]
    hex: Option<String>,

    #[arg(long)]
    report_json: bool,

    #[command(flatten)]
    policy: PolicyArgs,
}

#[derive(Args, Debug)]
struct EchoArgs {
    /// Written before each read.
    #[arg(long)]
    prompt: Option<String>,

    /// Bytes kept per line; the rest of a longer line is dropped.
    #[arg(long, value_name = "BYTES", value_parser = clap::value_parser!(u32).range(1..))]
    max_line_bytes: Option<u32>,

    #[command(flatten)]
    policy: PolicyArgs,
}

fn parse_tag(s: &str) -> Result<ValueTag, String> {
    ValueTag::parse(s).ok_or_else(|| {
        format!("unknown tag {s:?} (expected i32, i64, f32, f64, bool, text, array or object)")
    })
}

fn main() -> std::process::ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("wpp-inspect: {err:#}");
            std::process::ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<std::process::ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Command::Show(args) => cmd_show(args),
        Command::Probe(args) => cmd_probe(args),
        Command::Echo(args) => cmd_echo(args),
    }
}

fn stage(args: &ShowArgs) -> Result<StagedValue> {
    let tag_code = match (args.tag, args.raw_tag) {
        (Some(tag), _) => tag.code(),
        (None, Some(code)) => code,
        (None, None) => bail!("one of --tag or --raw-tag is required"),
    };
    if args.null {
        return Ok(StagedValue::null(tag_code));
    }
    let raw = args.value.as_deref().context("--value is required")?;
    let v: Value = serde_json::from_str(raw).context("parse --value JSON")?;
    match args.tag {
        Some(tag) => StagedValue::from_json(tag, &v),
        None => StagedValue::from_raw_tag(tag_code, &v),
    }
}

fn cmd_show(args: ShowArgs) -> Result<std::process::ExitCode> {
    let policy = args.policy.apply(Policy::from_env());
    let value = stage(&args)?;

    if args.report_json {
        let report = show(&value, &policy);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let mut stdout = std::io::stdout().lock();
        // The buffer was laid out for its own tag, or is null.
        unsafe { dispatch_to(&mut stdout, value.as_ptr(), value.tag_code(), &policy) }
            .context("write stdout")?;
        stdout.flush().context("flush stdout")?;
    }
    Ok(std::process::ExitCode::SUCCESS)
}

fn cmd_probe(args: ProbeArgs) -> Result<std::process::ExitCode> {
    let policy = args.policy.apply(Policy::from_env());
    let bytes = match (&args.text, &args.hex) {
        (Some(text), _) => text.as_bytes().to_vec(),
        (None, Some(h)) => hex::decode(h.trim()).context("decode --hex")?,
        (None, None) => bail!("one of --text or --hex is required"),
    };
    let report = probe_bytes(&bytes, &policy);

    if args.report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("probably_valid: {}", report.probably_valid);
        println!("looks_like_text: {}", report.looks_like_text);
        println!("plain_ascii: {}", report.plain_ascii);
        println!("text: {}", report.text);
    }
    Ok(std::process::ExitCode::SUCCESS)
}

fn cmd_echo(args: EchoArgs) -> Result<std::process::ExitCode> {
    let mut policy = args.policy.apply(Policy::from_env());
    if let Some(n) = args.max_line_bytes {
        policy.max_line_bytes = n;
    }

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut stdout = std::io::stdout().lock();
    loop {
        if let Some(prompt) = &args.prompt {
            stdout.write_all(prompt.as_bytes()).context("write prompt")?;
            stdout.flush().context("flush stdout")?;
        }
        let Some(bytes) =
            read_line_from(&mut input, policy.max_line_bytes as usize).context("read stdin")?
        else {
            break;
        };
        let p = line::stash_line(&bytes);
        // `stash_line` returns a NUL-terminated thread-local copy.
        let view = unsafe { render_text(p, &policy) };
        let mut out = view.to_bytes();
        out.push(b'\n');
        stdout.write_all(&out).context("write stdout")?;
    }
    stdout.flush().context("flush stdout")?;
    Ok(std::process::ExitCode::SUCCESS)
}
