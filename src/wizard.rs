//! Interactive setup
//!
//! Asks for everything the command line would otherwise carry and returns
//! the answers as the interactive [`ParamSet`]. The same [`Prompter`] is
//! used later for the build and cleanup confirmations.

use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::classifier::{self, RuntimeFamily};
use crate::logging::{log_info, log_warning};
use crate::resolver::{absolutize, ParamSet};

/// Save pattern offered by the wizard (RPG Maker VX Ace slots)
pub const WIZARD_SAVE_PATTERN: &str = "Save%02d.rvdata2";
pub const WIZARD_SAVE_START: i64 = 1;
pub const WIZARD_SAVE_END: i64 = 9;

// ============================================================================
// Prompting
// ============================================================================

pub trait Prompter {
    /// One trimmed line of input, or `None` once input is closed.
    fn ask(&mut self, prompt: &str) -> Option<String>;

    fn say(&mut self, line: &str) {
        println!("{}", line);
    }

    /// Yes/no question. Empty input (or closed input) takes the default.
    fn confirm(&mut self, prompt: &str, default_yes: bool) -> bool {
        let hint = if default_yes { "[Y/n]" } else { "[y/N]" };
        match self.ask(&format!("{} {}: ", prompt, hint)) {
            Some(answer) if !answer.is_empty() => {
                matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
            }
            _ => default_yes,
        }
    }
}

/// Reads answers from standard input.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&mut self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        let _ = io::stdout().flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

/// Answers from a fixed list, for unattended runs and tests.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    /// Every prompt shown, in order
    pub prompts: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &str) -> Option<String> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front().map(|a| a.trim().to_string())
    }

    fn say(&mut self, _line: &str) {}
}

// ============================================================================
// Wizard
// ============================================================================

/// Run the interactive setup. Returns `None` when input ends before every
/// question was answered.
pub fn run_wizard(prompter: &mut dyn Prompter, cwd: &Path) -> Option<ParamSet> {
    log_info("Entering interactive setup...");
    let mut params = ParamSet::default();

    let source = ask_source_dir(prompter, cwd)?;

    let default_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = prompter.ask(&format!("Application name (default: {}): ", default_name))?;
    params.app_name = Some(if name.is_empty() { default_name } else { name });

    let icon = prompter.ask("Custom icon file (leave empty to generate one): ")?;
    if !icon.is_empty() {
        let icon = absolutize(cwd, Path::new(&icon));
        if icon.is_file() {
            log_info(&format!("Using custom icon: {}", icon.display()));
            params.icon = Some(icon);
        } else {
            log_warning(&format!("Icon file {} not found, generating one", icon.display()));
        }
    }

    let family = ask_family(prompter, &source)?;
    params.runtime = Some(family.to_string());
    match family {
        RuntimeFamily::WebHosted => {
            params.root_save_files = ask_root_save_files(prompter, &source)?;
        }
        RuntimeFamily::NativeBinaryHosted => {
            params.executable = Some(ask_executable(prompter, &source)?);
            ask_save_mode(prompter, &source, &mut params)?;
        }
    }

    params.source_dir = Some(source);
    Some(params)
}

fn ask_source_dir(prompter: &mut dyn Prompter, cwd: &Path) -> Option<PathBuf> {
    loop {
        let answer = prompter.ask("Game source directory (e.g. ./game or /path/to/game): ")?;
        let dir = absolutize(cwd, Path::new(if answer.is_empty() { "./" } else { &answer }));

        if dir.is_dir() {
            log_info(&format!("Directory exists: {}", dir.display()));
            return Some(dir);
        }
        if dir.exists() {
            log_warning(&format!("Not a directory: {}", dir.display()));
            continue;
        }

        log_warning(&format!("Directory does not exist: {}", dir.display()));
        if prompter.confirm("Create this directory?", false) {
            match fs::create_dir_all(&dir) {
                Ok(()) => {
                    log_info(&format!("Created directory: {}", dir.display()));
                    return Some(dir);
                }
                Err(e) => log_warning(&format!("Failed to create directory: {}", e)),
            }
        }
    }
}

fn ask_family(prompter: &mut dyn Prompter, source: &Path) -> Option<RuntimeFamily> {
    let default = match classifier::classify(source) {
        RuntimeFamily::WebHosted => "1",
        RuntimeFamily::NativeBinaryHosted => "2",
    };

    prompter.say("");
    prompter.say("Game type:");
    prompter.say("1. NW.js/HTML5 game (package.json or index.html)");
    prompter.say("2. Wine/Windows game (*.exe files)");
    prompter.say("3. RPG Maker game (runs through Wine)");
    loop {
        let choice = prompter.ask(&format!("Select type [1-3] (default: {}): ", default))?;
        match if choice.is_empty() { default } else { choice.as_str() } {
            "1" => return Some(RuntimeFamily::WebHosted),
            "2" | "3" => return Some(RuntimeFamily::NativeBinaryHosted),
            _ => log_warning("Invalid choice, enter 1-3"),
        }
    }
}

fn ask_executable(prompter: &mut dyn Prompter, source: &Path) -> Option<PathBuf> {
    let found = classifier::list_executables(source);
    if !found.is_empty() {
        prompter.say("Detected executables:");
        return choose(prompter, "Select executable", &found);
    }
    loop {
        let exe = prompter.ask("Wine executable (e.g. game.exe): ")?;
        if !exe.is_empty() {
            return Some(PathBuf::from(exe));
        }
        log_warning("Please enter the executable name");
    }
}

fn ask_save_mode(prompter: &mut dyn Prompter, source: &Path, params: &mut ParamSet) -> Option<()> {
    prompter.say("");
    prompter.say("Save handling:");
    prompter.say("1. Directory redirect (save/, MCSSave/ ...)");
    prompter.say("2. Root save files (save.dat, config.ini ...)");
    prompter.say("3. Numbered save pattern (Save01, Save02 ...)");
    prompter.say("4. Hybrid (directory + root files)");
    let choice = prompter.ask("Select save mode (default: 2): ")?;

    match choice.as_str() {
        "1" => params.save_dir = Some(ask_save_dir(prompter, source)?),
        "" | "2" => params.root_save_files = ask_root_save_files(prompter, source)?,
        "3" => ask_save_pattern(prompter, params)?,
        "4" => {
            params.save_dir = Some(ask_save_dir(prompter, source)?);
            params.root_save_files = ask_root_save_files(prompter, source)?;
        }
        _ => {
            log_warning("Invalid choice, using root save files");
            params.root_save_files = ask_root_save_files(prompter, source)?;
        }
    }
    Some(())
}

fn ask_save_dir(prompter: &mut dyn Prompter, source: &Path) -> Option<PathBuf> {
    let found = classifier::list_save_directories(source);
    if !found.is_empty() {
        prompter.say("Possible save directories:");
        return choose(prompter, "Select save directory", &found);
    }
    loop {
        let dir = prompter.ask("Save directory (e.g. save): ")?;
        if !dir.is_empty() {
            return Some(PathBuf::from(dir));
        }
        log_warning("Please enter the save directory name");
    }
}

fn ask_root_save_files(prompter: &mut dyn Prompter, source: &Path) -> Option<Vec<PathBuf>> {
    let mut selected = Vec::new();

    let found = classifier::list_candidate_save_files(source);
    if !found.is_empty() {
        prompter.say("Possible save files:");
        for (i, file) in found.iter().enumerate() {
            prompter.say(&format!("  {}. {}", i + 1, file.display()));
        }
        let choices = prompter.ask("Files to redirect (e.g. 1,2,3 or 0 to skip): ")?;
        selected.extend(
            choices
                .split(',')
                .filter_map(|c| c.trim().parse::<usize>().ok())
                .filter(|i| (1..=found.len()).contains(i))
                .map(|i| found[i - 1].clone()),
        );
    }

    if selected.is_empty() {
        let manual = prompter.ask("Root save files, comma separated (e.g. save.dat,config.ini; empty to skip): ")?;
        selected.extend(split_file_list(&manual));
    }
    if !selected.is_empty() {
        let names: Vec<String> = selected.iter().map(|p| p.display().to_string()).collect();
        log_info(&format!("Root save files: {}", names.join(", ")));
    }
    Some(selected)
}

fn ask_save_pattern(prompter: &mut dyn Prompter, params: &mut ParamSet) -> Option<()> {
    let pattern = prompter.ask(&format!("Save file pattern (default: {}): ", WIZARD_SAVE_PATTERN))?;
    params.save_pattern = Some(if pattern.is_empty() {
        WIZARD_SAVE_PATTERN.to_string()
    } else {
        pattern
    });

    let start = prompter.ask(&format!("First number (default: {}): ", WIZARD_SAVE_START))?;
    params.save_start = Some(positive_or(&start, WIZARD_SAVE_START));
    let end = prompter.ask(&format!("Last number (default: {}): ", WIZARD_SAVE_END))?;
    params.save_end = Some(positive_or(&end, WIZARD_SAVE_END));
    Some(())
}

/// Numbered menu over `items`; empty input picks the first.
fn choose(prompter: &mut dyn Prompter, prompt: &str, items: &[PathBuf]) -> Option<PathBuf> {
    for (i, item) in items.iter().enumerate() {
        prompter.say(&format!("  {}. {}", i + 1, item.display()));
    }
    loop {
        let answer = prompter.ask(&format!("{} [1]: ", prompt))?;
        let index = if answer.is_empty() { Some(1) } else { answer.parse::<usize>().ok() };
        match index {
            Some(i) if (1..=items.len()).contains(&i) => {
                log_info(&format!("Selected: {}", items[i - 1].display()));
                return Some(items[i - 1].clone());
            }
            _ => log_warning(&format!("Invalid choice, enter 1-{}", items.len())),
        }
    }
}

fn positive_or(answer: &str, default: i64) -> i64 {
    answer.parse::<i64>().ok().filter(|n| *n > 0).unwrap_or(default)
}

/// Split a comma separated list of game-relative paths.
pub fn split_file_list(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}
