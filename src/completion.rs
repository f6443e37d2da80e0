//! # Shell Completion Module
//!
//! Completion scripts via `clap_complete`. The fish script also completes
//! `--genre` and `--mood` values from the catalog by calling the hidden
//! `complete-tags` command, which prints tags one per line.
//!
//! ## Usage
//!
//! ```bash
//! soundscape completion bash > ~/.local/share/bash-completion/completions/soundscape
//! soundscape completion zsh > ~/.config/zsh/completions/_soundscape
//! soundscape completion fish > ~/.config/fish/completions/soundscape.fish
//! ```

use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use soundscape::catalog::Catalog;
use std::io::{self, Write};

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Fish lines adding catalog tags as `--genre`/`--mood` candidates.
///
/// Appended after the generated script; fish merges them with the
/// existing option entries.
pub fn fish_tag_completions(bin: &str) -> String {
    let mut script = String::from("\n# Catalog tags for --genre and --mood\n");
    for (short, long) in [("g", "genre"), ("m", "mood")] {
        script.push_str(&format!(
            "complete -c {bin} -n '__fish_seen_subcommand_from curate publish' -s {short} -l {long} -x -a '({bin} complete-tags 2>/dev/null)'\n"
        ));
    }
    script
}

pub fn shell_to_completion_shell(shell: &crate::cli::Shell) -> CompletionShell {
    match shell {
        crate::cli::Shell::Bash => CompletionShell::Bash,
        crate::cli::Shell::Zsh => CompletionShell::Zsh,
        crate::cli::Shell::Fish => CompletionShell::Fish,
        crate::cli::Shell::PowerShell => CompletionShell::PowerShell,
        crate::cli::Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Genre and mood candidates, sorted and without duplicates.
pub fn tag_candidates(catalog: &Catalog) -> Vec<String> {
    let mut tags = catalog.all_genres();
    tags.extend(catalog.all_moods());
    tags.sort();
    tags.dedup();
    tags
}

/// Print tag candidates, one per line. Broken pipes are ignored.
pub fn print_tag_completions(catalog: &Catalog) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for tag in tag_candidates(catalog) {
        if let Err(e) = writeln!(out, "{tag}") {
            if e.kind() == io::ErrorKind::BrokenPipe {
                return Ok(());
            }
            return Err(e);
        }
    }
    Ok(())
}
