//! Interactive selection of devices and packages
//!
//! Input handling is split in two: `resolve_selection` is a pure mapping from
//! one line of input to a `Selection`, and `select` owns the reprompt loop.

use tracing::debug;

use crate::error::{HubError, Result};
use crate::terminal::Terminal;

const ALL_TOKEN: &str = "all";

/// How many candidates a prompt may resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Exactly one candidate
    SingleRequired,
    /// One candidate by index, or every candidate via `all`
    MultiOrAll,
}

/// A resolved answer to a selection prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Zero-based position in the candidate list
    Index(usize),
    All,
}

/// Map one line of operator input onto a selection.
///
/// Indices are 1-based as displayed. `all` is case-insensitive and only
/// accepted in `MultiOrAll` mode.
pub fn resolve_selection(input: &str, count: usize, mode: SelectionMode) -> Result<Selection> {
    let input = input.trim();

    if input.eq_ignore_ascii_case(ALL_TOKEN) {
        return match mode {
            SelectionMode::MultiOrAll => Ok(Selection::All),
            SelectionMode::SingleRequired => Err(HubError::InvalidSelection(
                "exactly one item must be selected".to_string(),
            )),
        };
    }

    match input.parse::<usize>() {
        Ok(idx) if idx >= 1 && idx <= count => Ok(Selection::Index(idx - 1)),
        Ok(idx) => Err(HubError::InvalidSelection(format!(
            "{} is out of range 1-{}",
            idx, count
        ))),
        Err(_) => Err(HubError::InvalidSelection(format!(
            "'{}' is not an index",
            input
        ))),
    }
}

fn prompt_text(what: &str, count: usize, mode: SelectionMode) -> String {
    match mode {
        SelectionMode::SingleRequired => {
            format!("Input index (1-{}) to select a {}: ", count, what)
        }
        SelectionMode::MultiOrAll => format!(
            "Input index (1-{}) to select a {}, or type \"all\" to select all: ",
            count, what
        ),
    }
}

/// Resolve `candidates` to the operator's choice.
///
/// An empty list fails with `NoCandidates`; a single candidate is returned
/// without prompting. Otherwise a 1-indexed list is shown and invalid input is
/// reprompted until a valid answer or end of input (`Cancelled`).
pub fn select<T, C, F>(
    terminal: &mut C,
    mut candidates: Vec<T>,
    mode: SelectionMode,
    what: &str,
    display: F,
) -> Result<Vec<T>>
where
    C: Terminal + ?Sized,
    F: Fn(&T) -> String,
{
    match candidates.len() {
        0 => return Err(HubError::NoCandidates(format!("No {} available.", what))),
        1 => return Ok(candidates),
        _ => {}
    }

    terminal.write_line(&format!("More than one {} found:", what));
    for (i, candidate) in candidates.iter().enumerate() {
        terminal.write_line(&format!("[{}] {}", i + 1, display(candidate)));
    }

    let prompt = prompt_text(what, candidates.len(), mode);
    loop {
        let input = terminal
            .prompt(&prompt)?
            .ok_or_else(|| HubError::Cancelled(format!("no {} selected", what)))?;

        match resolve_selection(&input, candidates.len(), mode) {
            Ok(Selection::All) => {
                debug!("Selected all {} {}(s)", candidates.len(), what);
                return Ok(candidates);
            }
            Ok(Selection::Index(idx)) => {
                let item = candidates.swap_remove(idx);
                terminal.write_line(&format!("Selected {}: {}", what, display(&item)));
                return Ok(vec![item]);
            }
            Err(e) => {
                debug!("{}", e);
                terminal.write_line("Invalid input, try again.");
            }
        }
    }
}

/// Ask a yes/no question; only `y` or `yes` confirms
pub fn confirm<T: Terminal + ?Sized>(terminal: &mut T, question: &str) -> Result<bool> {
    let answer = terminal.prompt(&format!("{} (y/n): ", question))?;
    Ok(matches!(
        answer.map(|a| a.trim().to_lowercase()).as_deref(),
        Some("y") | Some("yes")
    ))
}
