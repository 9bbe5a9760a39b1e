use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;

use course_core::chapter::{Chapter, Committed};
use course_core::git::GitClient;
use course_core::runner::{ProcessRunner, TestReport};
use course_core::{Config, CourseError, Repository, Result};

mod args;
mod logging;

use args::{Cli, Commands, Shell};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Some(Commands::Init {
            url,
            directory,
            upstream,
        }) => handle_init(&url, directory.as_deref(), upstream.as_deref()),
        Some(Commands::Chapters { modified }) => handle_chapters(modified),
        Some(Commands::Test { all }) => handle_test(all),
        Some(Commands::Upload { all }) => handle_upload(all),
        Some(Commands::Sync) => handle_sync(),
        Some(Commands::Status) => handle_status(),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "course", &mut io::stdout());
}

/// Open the repository containing the current directory.
fn open_repository() -> Result<Repository> {
    Repository::open(env::current_dir()?)
}

/// Resolve the chapter the user is standing in, or report a user error.
fn current_chapter(repo: &Repository) -> Result<Chapter<'_>> {
    let cwd = env::current_dir()?;
    repo.chapter_from_path(&cwd)?
        .ok_or(CourseError::NotAChapterDirectory { path: cwd })
}

/// Chapters in stable id order; discovery itself enumerates in filesystem
/// order.
fn sorted_chapters(repo: &Repository) -> Result<Vec<Chapter<'_>>> {
    let mut chapters = repo.chapters()?;
    chapters.sort_by(|a, b| a.id().cmp(b.id()));
    Ok(chapters)
}

fn handle_init(url: &str, directory: Option<&Path>, upstream: Option<&str>) -> Result<()> {
    let target: PathBuf = directory
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("course"));

    println!("Cloning {} into {} ...", url.cyan(), target.display());
    GitClient::clone_repo(url, &target)?;

    if let Some(upstream_url) = upstream {
        println!("Adding remote {} -> {}", "upstream".cyan(), upstream_url);
        GitClient::new(&target).add_remote("upstream", upstream_url)?;
    }

    Config::write_default(&target, upstream)?;

    println!("{}", "Done!".green());
    Ok(())
}

fn handle_chapters(only_modified: bool) -> Result<()> {
    let repo = open_repository()?;

    for chapter in sorted_chapters(&repo)? {
        let modified = chapter.is_modified()?;
        if only_modified && !modified {
            continue;
        }

        let prefix = if modified {
            "*".yellow().bold().to_string()
        } else {
            ".".dimmed().to_string()
        };
        println!("{} {}", prefix, chapter.id());
    }

    Ok(())
}

fn handle_test(all: bool) -> Result<()> {
    let repo = open_repository()?;
    let config = Config::load(repo.root_dir()?)?;
    let runner = ProcessRunner::new(&config.runner.command);
    runner.require_available()?;

    if all {
        let mut reports = Vec::new();
        for chapter in sorted_chapters(&repo)? {
            let report = chapter.run_tests(&runner)?;
            print_lines(&chapter_report_lines(chapter.id(), &report));
            reports.push(report);
        }
        let (grade, maximum) = TestReport::combined_total(&reports);
        println!("total {} {}", grade, maximum);
    } else {
        let chapter = current_chapter(&repo)?;
        let report = chapter.run_tests(&runner)?;
        print_lines(&chapter_report_lines(chapter.id(), &report));
    }

    Ok(())
}

/// One chapter's summary: a `<id>/<section> <grade> <maximum>` line per
/// section, then the chapter's `total <grade> <maximum>` line.
fn chapter_report_lines(id: &str, report: &TestReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .results
        .iter()
        .map(|(section, score)| format!("{}/{} {} {}", id, section, score.grade, score.maximum))
        .collect();
    let (grade, maximum) = report.total();
    lines.push(format!("total {} {}", grade, maximum));
    lines
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn handle_upload(all: bool) -> Result<()> {
    let repo = open_repository()?;

    let committed = if all {
        let chapters = sorted_chapters(&repo)?;
        let mut committed = 0;
        for chapter in &chapters {
            match chapter.commit_solution()? {
                Committed::Committed => {
                    println!("{} {}", "uploaded".green(), chapter.id());
                    committed += 1;
                }
                Committed::Skipped => {
                    println!("{} {}", "unchanged".dimmed(), chapter.id());
                }
            }
        }
        committed
    } else {
        let chapter = current_chapter(&repo)?;
        println!("Uploading solutions for chapter {} ...", chapter.id().cyan());
        match chapter.commit_solution()? {
            Committed::Committed => 1,
            Committed::Skipped => {
                println!("Nothing to commit for {}", chapter.id());
                0
            }
        }
    };

    if committed > 0 {
        println!("Pushing to {} ...", "origin".cyan());
        repo.push_origin()?;
    }

    println!("{}", "Done!".green());
    Ok(())
}

fn handle_sync() -> Result<()> {
    let repo = open_repository()?;
    let config = Config::load(repo.root_dir()?)?;

    repo.verify_upstream(config.upstream.url.as_deref())?;

    println!("Pulling from {} ...", "upstream".cyan());
    repo.pull_upstream()?;

    println!("Pushing to {} ...", "origin".cyan());
    repo.push_origin()?;

    println!("{}", "Done!".green());
    Ok(())
}

fn handle_status() -> Result<()> {
    let repo = open_repository()?;
    for entry in repo.status()? {
        println!("{} {}", entry.code, entry.path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use course_core::runner::SectionScore;

    use super::*;

    fn report(sections: &[(&str, u32, u32)]) -> TestReport {
        let mut results = BTreeMap::new();
        for (name, grade, maximum) in sections {
            results.insert(
                name.to_string(),
                SectionScore {
                    grade: *grade,
                    maximum: *maximum,
                },
            );
        }
        TestReport { results }
    }

    #[test]
    fn chapter_summary_ends_with_its_total() {
        let lines = chapter_report_lines("intro", &report(&[("section1", 8, 10)]));
        assert_eq!(lines, vec!["intro/section1 8 10", "total 8 10"]);
    }

    #[test]
    fn chapter_summary_lists_every_section() {
        let lines = chapter_report_lines("basics", &report(&[("a", 3, 5), ("b", 2, 5)]));
        assert_eq!(lines, vec!["basics/a 3 5", "basics/b 2 5", "total 5 10"]);
    }

    #[test]
    fn repository_total_spans_chapters() {
        let reports = [report(&[("section1", 8, 10)]), report(&[("section1", 5, 5)])];
        assert_eq!(TestReport::combined_total(&reports), (13, 15));
    }
}

