//! AGamePack - package games as AppImages with persistent saves
//!
//! ```bash
//! # Interactive setup
//! agamepack
//!
//! # NW.js game, build without asking
//! agamepack -r ./game -n "My Game" -b
//!
//! # Wine game with root save files
//! agamepack -r old_game -n OldGame --wine-exec game.exe --root-save save.dat,config.ini -y
//! ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use agamepack::config::AppSettings;
use agamepack::logging::{init_logger, log_error, log_info};
use agamepack::wizard::{run_wizard, split_file_list, TerminalPrompter};
use agamepack::{BuildFlags, ConfigResolver, PackageAssembler, ParamSet};

/// Build AppImage game packages with saves kept outside the image
#[derive(Parser, Debug)]
#[command(name = "agamepack")]
#[command(version)]
#[command(after_help = "Run without arguments for interactive setup.")]
struct Cli {
    /// Game source directory
    #[arg(short = 'r', long = "game-dir")]
    game_dir: Option<PathBuf>,

    /// Application name
    #[arg(short, long)]
    name: Option<String>,

    /// Custom icon file
    #[arg(short, long)]
    icon: Option<PathBuf>,

    /// Package type (nwjs/wine)
    #[arg(short = 't', long = "type")]
    package_type: Option<String>,

    /// Windows executable, relative to the game directory
    #[arg(long)]
    wine_exec: Option<PathBuf>,

    /// Wine runner command (default: proton-ge, falls back to wine)
    #[arg(long)]
    wine_cmd: Option<String>,

    /// Save directory to redirect as a whole (Wine games)
    #[arg(long)]
    wine_save: Option<PathBuf>,

    /// Root save files, comma separated
    #[arg(long = "root-save", alias = "root-save-files")]
    root_save: Option<String>,

    /// Output file name
    #[arg(short, long)]
    output: Option<String>,

    /// Numbered save file pattern (default: Save%d)
    #[arg(long)]
    save_pattern: Option<String>,

    /// First save number (default: 1)
    #[arg(long, allow_negative_numbers = true)]
    save_start: Option<i64>,

    /// Last save number (default: 10)
    #[arg(long, allow_negative_numbers = true)]
    save_end: Option<i64>,

    /// Build without asking
    #[arg(short = 'b', long = "build")]
    build: bool,

    /// Skip all confirmations
    #[arg(short = 'y', long = "yes")]
    yes: bool,

    /// Persistent save root for NW.js games
    #[arg(long)]
    save_root: Option<PathBuf>,

    /// Persistent archive root for Wine games
    #[arg(long)]
    archive_root: Option<PathBuf>,

    /// NW.js executable
    #[arg(long)]
    nwjs_path: Option<PathBuf>,

    /// appimagetool executable
    #[arg(long)]
    appimagetool: Option<PathBuf>,

    /// Assembly directory (default: ./build)
    #[arg(long)]
    build_dir: Option<PathBuf>,

    /// Remember --save-root, --archive-root, --wine-cmd, --nwjs-path and
    /// --appimagetool for later runs
    #[arg(long)]
    save_settings: bool,
}

impl Cli {
    fn params(&self) -> ParamSet {
        ParamSet {
            source_dir: self.game_dir.clone(),
            app_name: self.name.clone(),
            icon: self.icon.clone(),
            runtime: self.package_type.clone(),
            executable: self.wine_exec.clone(),
            save_dir: self.wine_save.clone(),
            root_save_files: self.root_save.as_deref().map(split_file_list).unwrap_or_default(),
            save_pattern: self.save_pattern.clone(),
            save_start: self.save_start,
            save_end: self.save_end,
            output_name: self.output.clone(),
            save_root: self.save_root.clone(),
            archive_root: self.archive_root.clone(),
            wine_cmd: self.wine_cmd.clone(),
            nwjs_path: self.nwjs_path.clone(),
            appimagetool: self.appimagetool.clone(),
            assembly_root: self.build_dir.clone(),
        }
    }

    fn flags(&self) -> BuildFlags {
        BuildFlags {
            auto_build: self.build,
            force: self.yes,
        }
    }

    /// Persist tool settings given on this invocation.
    fn store_settings(&self, settings: &mut AppSettings) {
        if let Some(root) = &self.save_root {
            settings.save_root = root.clone();
        }
        if let Some(root) = &self.archive_root {
            settings.archive_root = root.clone();
        }
        if let Some(cmd) = &self.wine_cmd {
            settings.wine_cmd = cmd.clone();
        }
        if let Some(nw) = &self.nwjs_path {
            settings.nwjs_path = nw.clone();
        }
        if let Some(tool) = &self.appimagetool {
            settings.appimagetool = Some(tool.clone());
        }
        settings.save();
        log_info("Settings saved");
    }
}

fn main() -> ExitCode {
    let interactive = env::args_os().len() <= 1;
    let cli = Cli::parse();

    init_logger();
    log_info(&format!("AGamePack v{} starting up...", env!("CARGO_PKG_VERSION")));

    let cwd = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            log_error(&format!("Cannot determine working directory: {}", e));
            return ExitCode::from(1);
        }
    };

    let mut settings = AppSettings::load();
    if cli.save_settings {
        cli.store_settings(&mut settings);
    }

    let mut prompter = TerminalPrompter;
    let answers = if interactive {
        match run_wizard(&mut prompter, &cwd) {
            Some(answers) => Some(answers),
            None => {
                log_error("Input closed before setup was complete");
                return ExitCode::from(1);
            }
        }
    } else {
        None
    };

    let config = match ConfigResolver::new(&settings, &cwd)
        .explicit(cli.params())
        .interactive(answers)
        .flags(cli.flags())
        .resolve()
    {
        Ok(config) => config,
        Err(e) => {
            log_error(&format!("Configuration error: {}", e));
            return ExitCode::from(1);
        }
    };

    match PackageAssembler::new(&config).run(&mut prompter) {
        Ok(result) => ExitCode::from(result.exit_code()),
        Err(e) => {
            log_error(&format!("Packaging failed: {}", e));
            ExitCode::from(1)
        }
    }
}
