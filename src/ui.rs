// UI layer: interactive menu built on `dialoguer`, spinners from
// `indicatif` while a request is outstanding, and `crossterm` styling for
// the rendered cards.

use crate::api::{ApiClient, LibraryApi};
use crate::config::Config;
use crate::controller::{LibraryController, MutationOutcome, Notifier};
use crate::model::{Mode, UploadForm};
use crate::view::{Card, LibraryView};
use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// Alert/confirm dialogs in the terminal.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, message: &str) {
        println!("{}", message.bold());
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
    }
}

/// Spinner shown while a request is outstanding. Call `finish_and_clear`
/// when it completes.
fn spinner(message: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

/// Main interactive menu. Runs until the user chooses "Exit".
pub fn main_menu(api: ApiClient, config: &Config) -> Result<()> {
    let base_url = api.base_url().to_string();
    let ctl = LibraryController::new(api, TerminalNotifier);
    println!("Audio library at {}", base_url.as_str().underlined());

    loop {
        let items = vec![
            "Browse public library",
            "Manage my library",
            "Upload audio",
            "Download audio",
            "Exit",
        ];
        let selection = Select::new().items(&items).default(0).interact()?;
        match selection {
            0 => {
                if let Some(view) = load(&ctl, Mode::Public)? {
                    print_view(&view, &base_url);
                }
            }
            1 => manage(&ctl, &base_url)?,
            2 => {
                let form = upload_form(config)?;
                if let Some(file) = &form.file {
                    println!("Uploading {}...", file.display());
                }
                let outcome = ctl.upload(form);
                report(&ctl, outcome, &base_url);
            }
            3 => download(&ctl, config)?,
            4 => break,
            _ => {}
        }
    }
    Ok(())
}

type TerminalController<A> = LibraryController<A, TerminalNotifier>;

/// Load a listing. A listing failure is printed and gives `None` so the
/// menu keeps running.
fn load<A: LibraryApi>(ctl: &TerminalController<A>, mode: Mode) -> Result<Option<LibraryView>> {
    let sp = spinner("Loading library...")?;
    let result = ctl.load(mode);
    sp.finish_and_clear();
    match result {
        Ok(view) => Ok(Some(view)),
        Err(e) => {
            println!("{} {:#}", "Could not load library:".red(), e);
            Ok(None)
        }
    }
}

/// Follow up a mutation: reload the stale listing, if any, and show it.
fn report<A: LibraryApi>(ctl: &TerminalController<A>, outcome: MutationOutcome, base_url: &str) {
    match ctl.refresh(outcome) {
        Ok(Some(view)) => print_view(&view, base_url),
        Ok(None) => {}
        Err(e) => println!("{} {:#}", "Could not reload library:".red(), e),
    }
}

/// Private library: list the cards, pick one to delete, repeat until back.
fn manage<A: LibraryApi>(ctl: &TerminalController<A>, base_url: &str) -> Result<()> {
    let Some(mut view) = load(ctl, Mode::Private)? else {
        return Ok(());
    };
    loop {
        print_view(&view, base_url);

        let deletable: Vec<&Card> = view.cards.iter().filter(|c| c.delete.is_some()).collect();
        let mut items: Vec<String> = deletable
            .iter()
            .map(|c| format!("Delete \"{}\" ({})", c.name, c.category))
            .collect();
        items.push("Back".into());

        let selection = Select::new().items(&items).default(items.len() - 1).interact()?;
        let Some(path) = deletable
            .get(selection)
            .and_then(|c| c.delete.as_ref())
            .map(|d| d.path.clone())
        else {
            return Ok(());
        };

        let outcome = ctl.delete(&path)?;
        match ctl.refresh(outcome) {
            Ok(Some(fresh)) => view = fresh,
            Ok(None) => {}
            Err(e) => {
                println!("{} {:#}", "Could not reload library:".red(), e);
                return Ok(());
            }
        }
    }
}

/// Collect the upload form: file (native picker or typed path), category
/// and visibility. An empty path means no file was selected.
fn upload_form(config: &Config) -> Result<UploadForm> {
    let sources = vec!["Choose with file dialog", "Type a path"];
    let source = Select::new().items(&sources).default(0).interact()?;
    let file = match source {
        0 => rfd::FileDialog::new()
            .add_filter("Audio", &["mp3", "wav", "ogg", "flac", "m4a", "aac"])
            .pick_file(),
        _ => {
            let path: String = Input::new()
                .with_prompt("Audio file path")
                .allow_empty(true)
                .interact_text()?;
            let path = path.trim();
            (!path.is_empty()).then(|| PathBuf::from(path))
        }
    };
    let category: String = Input::new()
        .with_prompt("Category")
        .default(config.category.clone())
        .interact_text()?;
    let public = Confirm::new()
        .with_prompt("Make public?")
        .default(false)
        .interact()?;
    Ok(UploadForm {
        file,
        category,
        public,
    })
}

fn download<A: LibraryApi>(ctl: &TerminalController<A>, config: &Config) -> Result<()> {
    let modes = vec!["Public library", "My library"];
    let mode = match Select::new().items(&modes).default(0).interact()? {
        0 => Mode::Public,
        _ => Mode::Private,
    };
    let Some(view) = load(ctl, mode)? else {
        return Ok(());
    };
    if view.cards.is_empty() {
        println!("{}", "Library is empty.".dim());
        return Ok(());
    }

    let items: Vec<String> = view
        .cards
        .iter()
        .map(|c| format!("{} ({})", c.name, c.category))
        .collect();
    let selection = Select::new().items(&items).default(0).interact()?;
    let path = view.cards[selection].path.clone();

    let sp = spinner("Downloading...")?;
    let result = ctl.download(&path, &config.download_dir);
    sp.finish_and_clear();
    match result {
        Ok(dest) => println!("Saved to {}", dest.display()),
        Err(e) => println!("{} {:#}", "Download failed:".red(), e),
    }
    Ok(())
}

/// Print the cards of a view. Stands in for replacing the container's
/// content on the page.
fn print_view(view: &LibraryView, base_url: &str) {
    let title = match view.mode {
        Mode::Public => "Public library",
        Mode::Private => "My library",
    };
    println!();
    println!("{} {}", title.bold(), format!("#{}", view.container_id).dim());
    if view.cards.is_empty() {
        println!("  {}", "(no files)".dim());
    }
    for card in &view.cards {
        println!("  {}", card.name.as_str().bold());
        println!("    {}", card.category.as_str().italic());
        println!("    {} {}{}", "♪".cyan(), base_url, card.media_url);
        if card.delete.is_some() {
            println!("    {}", "[Delete]".red());
        }
    }
    println!();
}
