use anyhow::Context;
use colored::Colorize;
use serde_json::json;

use ballot_ledger::{InMemoryLedger, LedgerConfig, LedgerValidator, ReplayEngine, VotingQueries};
use ballot_types::{BallotId, Identity};

use crate::cli::*;
use crate::script::{Script, StepReport};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match &cli.command {
        Command::Run(args) => cmd_run(&cli, args, format),
        Command::Verify(args) => cmd_verify(&cli, args, format),
        Command::Replay(args) => cmd_replay(&cli, args, format),
        Command::Results(args) => cmd_results(&cli, args, format),
        Command::Identity(args) => cmd_identity(args, format),
    }
}

/// Resolve the ledger configuration: file, then script admin, then `--admin`.
fn ledger_config(cli: &Cli, script: &Script) -> anyhow::Result<LedgerConfig> {
    let mut config = match &cli.config {
        Some(path) => LedgerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => LedgerConfig::default(),
    };
    if let Some(label) = cli.admin.as_ref().or(script.admin.as_ref()) {
        config.admin = Identity::from_label(label);
    }
    Ok(config)
}

fn execute(
    cli: &Cli,
    args: &ScriptArgs,
) -> anyhow::Result<(Script, InMemoryLedger, Vec<StepReport>)> {
    let script = Script::load(&args.script)?;
    let ledger = InMemoryLedger::new(ledger_config(cli, &script)?);
    let reports = script.execute(&ledger);
    Ok((script, ledger, reports))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_step(report: &StepReport) {
    let head = format!(
        "{:>3} @{:<5} {:<10} {:<18}",
        report.step, report.seq, report.caller, report.op
    );
    match (&report.outcome, &report.error) {
        (Some(outcome), _) => println!("{} {} {}", head, "✓".green(), outcome),
        (_, Some(error)) => println!(
            "{} {} {} ({})",
            head,
            "✗".red(),
            error.name.red(),
            error.code
        ),
        (None, None) => println!("{head}"),
    }
}

fn cmd_run(cli: &Cli, args: &ScriptArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (_, ledger, reports) = execute(cli, args)?;
    let failed = reports.iter().filter(|r| !r.succeeded()).count();

    if format == OutputFormat::Json {
        return print_json(&json!({
            "steps": reports,
            "failed": failed,
            "journal_head": ledger.journal_head().map(|r| hex::encode(r.receipt_hash)),
        }));
    }

    for report in &reports {
        print_step(report);
    }
    println!(
        "\n{} step(s), {} committed, {} failed",
        reports.len().to_string().bold(),
        (reports.len() - failed).to_string().green(),
        failed.to_string().red()
    );
    if let Some(head) = ledger.journal_head() {
        println!("Journal head: r#{} {}", head.index, head.short_hash().yellow());
    }
    Ok(())
}

fn cmd_verify(cli: &Cli, args: &ScriptArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (_, ledger, _) = execute(cli, args)?;
    let report = LedgerValidator::validate(&ledger);

    if format == OutputFormat::Json {
        let violations: Vec<_> = report
            .violations
            .iter()
            .map(|v| {
                json!({
                    "kind": format!("{:?}", v.kind),
                    "receipt": v.receipt,
                    "ballot": v.ballot,
                    "description": v.description,
                })
            })
            .collect();
        return print_json(&json!({
            "valid": report.is_valid(),
            "receipts": report.receipt_count,
            "ballots": report.ballot_count,
            "violations": violations,
        }));
    }

    let mark = |ok: bool| if ok { "valid".green() } else { "BROKEN".red().bold() };
    println!(
        "Audited {} receipt(s) across {} ballot(s)",
        report.receipt_count.to_string().bold(),
        report.ballot_count.to_string().bold()
    );
    println!("  Journal chain: {}", mark(report.journal_valid));
    println!("  Tallies: {}", mark(report.tallies_consistent));
    for violation in &report.violations {
        println!("  {} {:?}: {}", "✗".red(), violation.kind, violation.description);
    }
    if !report.is_valid() {
        anyhow::bail!("{} violation(s) found", report.violations.len());
    }
    println!("{} Ledger verified", "✓".green().bold());
    Ok(())
}

fn cmd_replay(cli: &Cli, args: &ReplayArgs, format: OutputFormat) -> anyhow::Result<()> {
    let script_args = ScriptArgs {
        script: args.script.clone(),
    };
    let (_, ledger, _) = execute(cli, &script_args)?;
    let journal = ledger.journal();

    let replayed = match args.until {
        Some(index) => ReplayEngine::replay_until(ledger.config(), &journal, index)?,
        None => ReplayEngine::replay(ledger.config(), &journal)?,
    };
    let converged = replayed.snapshot() == ledger.snapshot();

    if format == OutputFormat::Json {
        return print_json(&json!({
            "replayed": replayed.journal_len(),
            "journal": journal.len(),
            "converged": converged,
            "state": replayed.snapshot(),
        }));
    }

    println!(
        "Replayed {} of {} receipt(s)",
        replayed.journal_len().to_string().bold(),
        journal.len()
    );
    if converged {
        println!("{} Replayed state matches live state", "✓".green().bold());
    } else if args.until.is_some() {
        println!("Replayed state is a historical view");
    } else {
        anyhow::bail!("replayed state diverges from live state");
    }
    Ok(())
}

fn cmd_results(cli: &Cli, args: &ResultsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let script_args = ScriptArgs {
        script: args.script.clone(),
    };
    let (script, ledger, _) = execute(cli, &script_args)?;
    let now = args.seq.unwrap_or_else(|| script.last_seq());
    let results = ledger
        .ballot_results(BallotId::new(args.ballot), now)
        .map_err(|e| anyhow::anyhow!("ballot {}: {} ({})", args.ballot, e.as_str(), e.code()))?;

    if format == OutputFormat::Json {
        return print_json(&results);
    }

    println!(
        "Ballot {}: {} [{}]",
        results.ballot_id.to_string().yellow().bold(),
        results.title.as_str().bold(),
        results.status.as_str().cyan()
    );
    println!(
        "  Window: seq {}..={}  Creator: {}",
        results.start_seq, results.end_seq, results.creator
    );
    let leaders: Vec<u32> = results.leaders().iter().map(|t| t.index).collect();
    for tally in &results.tallies {
        let line = format!("  [{}] {:<50} {}", tally.index, tally.text.as_str(), tally.count);
        if leaders.contains(&tally.index) {
            println!("{}", line.green());
        } else {
            println!("{line}");
        }
    }
    println!("  Total votes: {}", results.total_votes.to_string().bold());
    Ok(())
}

fn cmd_identity(args: &IdentityArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (source, identity) = match (&args.label, &args.pubkey) {
        (_, Some(key)) => (
            key.as_str(),
            Identity::from_public_key_hex(key).context("parsing public key")?,
        ),
        (Some(label), None) => (label.as_str(), Identity::from_label(label)),
        (None, None) => anyhow::bail!("either a label or --pubkey is required"),
    };
    if format == OutputFormat::Json {
        return print_json(&json!({ "source": source, "identity": identity }));
    }
    println!("{} {}", source.bold(), identity.to_hex().cyan());
    Ok(())
}
