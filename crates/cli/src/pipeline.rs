//! `sigflow run`: read one line, push it through the pipeline, print the verdict.

use crate::cli::RunArgs;
use color_eyre::eyre::{bail, WrapErr};
use sp_core::config::validate_settings;
use sp_core::pipeline::{bound_payload, PipelineOrchestrator, RunReport, StageExit, WorkerCommand};
use sp_protocol::config_models::Settings;
use sp_protocol::pipeline_models::Verdict;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;

pub fn run(mut settings: Settings, args: RunArgs) -> color_eyre::Result<()> {
    if let Some(dir) = args.channel_dir {
        settings.pipeline.channel_dir = dir;
    }
    if let Some(max_payload) = args.max_payload {
        settings.pipeline.max_payload = max_payload;
    }
    validate_settings(&settings, Path::new("command line"))?;

    // A line that bounds to nothing would fail stage 1 and strand the run.
    let payload = bound_payload(&read_payload()?, settings.pipeline.max_payload);
    if payload.is_empty() {
        bail!("nothing to process: the input line is empty");
    }

    let orchestrator = PipelineOrchestrator::new(settings.pipeline, WorkerCommand::current_exe()?);
    let report = orchestrator.run(&payload)?;

    print_report(&report, &mut io::stdout().lock())?;
    Ok(())
}

/// Read one line from stdin, without its line ending.
fn read_payload() -> color_eyre::Result<Vec<u8>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        print!("Enter the text to process: ");
        io::stdout().flush()?;
    }

    let mut line = Vec::new();
    stdin
        .lock()
        .read_until(b'\n', &mut line)
        .wrap_err("failed to read the payload from stdin")?;
    trim_line_ending(&mut line);
    Ok(line)
}

fn trim_line_ending(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
}

fn print_report(report: &RunReport, out: &mut impl Write) -> io::Result<()> {
    let answer = match report.verdict {
        Verdict::Match => "Yes",
        Verdict::Mismatch => "No",
    };
    for stage in &report.stages {
        writeln!(out, "{}", describe_exit(stage))?;
    }
    writeln!(out, "Final payload: '{}'", String::from_utf8_lossy(&report.processed))?;
    writeln!(out, "Matches the original: {answer}")
}

fn describe_exit(stage: &StageExit) -> String {
    match stage.code {
        Some(code) => format!("Stage {} (PID {}) exited with status {code}.", stage.ordinal, stage.pid),
        None => format!("Stage {} (PID {}) was killed by a signal.", stage.ordinal, stage.pid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_line_ending() {
        let mut unix = b"Hola\n".to_vec();
        trim_line_ending(&mut unix);
        assert_eq!(unix, b"Hola");

        let mut dos = b"Hola\r\n".to_vec();
        trim_line_ending(&mut dos);
        assert_eq!(dos, b"Hola");

        let mut last_line = b"Hola".to_vec();
        trim_line_ending(&mut last_line);
        assert_eq!(last_line, b"Hola");
    }

    #[test]
    fn test_print_report() {
        let report = RunReport {
            original: b"Hola".to_vec(),
            processed: b"aloH".to_vec(),
            verdict: Verdict::Mismatch,
            stages: Vec::new(),
        };

        let mut out = Vec::new();
        print_report(&report, &mut out).expect("write report");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "Final payload: 'aloH'\nMatches the original: No\n"
        );
    }

    #[test]
    fn test_print_report_lists_stage_exits() {
        let report = RunReport {
            original: b"ab".to_vec(),
            processed: b"ba".to_vec(),
            verdict: Verdict::Mismatch,
            stages: vec![
                StageExit {
                    ordinal: 1,
                    pid: 100,
                    code: Some(0),
                    success: true,
                },
                StageExit {
                    ordinal: 2,
                    pid: 101,
                    code: None,
                    success: false,
                },
            ],
        };

        let mut out = Vec::new();
        print_report(&report, &mut out).expect("write report");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "Stage 1 (PID 100) exited with status 0.\n\
             Stage 2 (PID 101) was killed by a signal.\n\
             Final payload: 'ba'\n\
             Matches the original: No\n"
        );
    }
}
