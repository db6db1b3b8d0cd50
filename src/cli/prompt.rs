//! Interactive backup selection
//!
//! The prompt shows a 1-based menu and turns one line of operator input into
//! a 0-based catalog index. Input comes from an [`InputSource`] so the same
//! validation runs for the console, the `--select` flag and tests.

use std::io::{self, BufRead, Write};

use log::debug;

use crate::backup::BackupCatalog;
use crate::display::format_backup_menu;
use crate::error::{RestoreError, RestoreResult};

/// Something that can show a menu and return one line of raw input
pub trait InputSource {
    /// Present `menu` and return the operator's raw answer
    fn prompt(&mut self, menu: &str) -> io::Result<String>;
}

/// Reads the answer from stdin after printing the menu to stdout
#[derive(Debug, Default)]
pub struct ConsoleInput;

impl InputSource for ConsoleInput {
    fn prompt(&mut self, menu: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(menu.as_bytes())?;
        stdout.flush()?;

        // EOF leaves the line empty, which fails selection as non-numeric
        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        Ok(input)
    }
}

/// Returns a fixed answer without blocking
///
/// The menu is still printed so a non-interactive run shows what was chosen.
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    answer: String,
    echo: bool,
    shown: Vec<String>,
}

impl ScriptedInput {
    /// Answer every prompt with `answer`, echoing the menu to stdout
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            echo: true,
            shown: Vec::new(),
        }
    }

    /// Answer every prompt with `answer` and print nothing
    pub fn silent(answer: impl Into<String>) -> Self {
        Self {
            echo: false,
            ..Self::new(answer)
        }
    }

    /// Menus this source has been shown, in order
    pub fn shown(&self) -> &[String] {
        &self.shown
    }
}

impl InputSource for ScriptedInput {
    fn prompt(&mut self, menu: &str) -> io::Result<String> {
        self.shown.push(menu.to_string());
        if self.echo {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}{}", menu, self.answer)?;
        }
        Ok(self.answer.clone())
    }
}

/// Presents the catalog and validates the operator's choice
pub struct SelectionPrompt<I: InputSource> {
    input: I,
}

impl<I: InputSource> SelectionPrompt<I> {
    /// Create a prompt reading from `input`
    pub fn new(input: I) -> Self {
        Self { input }
    }

    /// Ask for a backup and return its 0-based index
    ///
    /// There is no re-prompt: a bad answer ends the selection with
    /// `InvalidInput` or `OutOfRange`.
    pub fn choose(&mut self, catalog: &BackupCatalog) -> RestoreResult<usize> {
        let menu = format_backup_menu(catalog);
        let raw = self
            .input
            .prompt(&menu)
            .map_err(|e| RestoreError::Io(format!("Failed to read selection: {}", e)))?;

        let index = parse_selection(&raw, catalog.len())?;
        debug!("Operator selected index {}", index);
        Ok(index)
    }

    /// Give back the input source
    pub fn into_inner(self) -> I {
        self.input
    }
}

/// Convert a 1-based answer into a 0-based index in `[0, len)`
pub fn parse_selection(raw: &str, len: usize) -> RestoreResult<usize> {
    let trimmed = raw.trim();

    let selection: i64 = match trimmed.parse() {
        Ok(n) => n,
        // Digits too long for i64 are still a number, just not one on the menu
        Err(_) if is_integer_literal(trimmed) => {
            let selection = if trimmed.starts_with('-') {
                i64::MIN
            } else {
                i64::MAX
            };
            return Err(RestoreError::OutOfRange {
                selection,
                max: len,
            });
        }
        Err(_) => return Err(RestoreError::InvalidInput(trimmed.to_string())),
    };

    if selection < 1 || selection as u64 > len as u64 {
        return Err(RestoreError::OutOfRange {
            selection,
            max: len,
        });
    }

    Ok((selection - 1) as usize)
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn catalog_of(count: usize) -> (BackupCatalog, TempDir) {
        let temp = TempDir::new().unwrap();
        for i in 0..count {
            fs::write(temp.path().join(format!("b{}.sql.enc", i)), b"x").unwrap();
        }
        (BackupCatalog::scan(temp.path()).unwrap(), temp)
    }

    #[test]
    fn test_parse_selection_bounds() {
        for n in 1..=5usize {
            for s in -1..=(n as i64 + 1) {
                let result = parse_selection(&s.to_string(), n);
                if (1..=n as i64).contains(&s) {
                    assert_eq!(result.unwrap(), (s - 1) as usize);
                } else {
                    assert!(
                        matches!(result, Err(RestoreError::OutOfRange { selection, max }) if selection == s && max == n)
                    );
                }
            }
        }
    }

    #[test]
    fn test_parse_selection_trims_whitespace() {
        assert_eq!(parse_selection("  2 \n", 3).unwrap(), 1);
        assert_eq!(parse_selection("+3", 3).unwrap(), 2);
    }

    #[test]
    fn test_parse_selection_non_numeric() {
        for raw in ["abc", "", "\n", "1.5", "2a", "one", "- 1"] {
            assert!(
                matches!(parse_selection(raw, 3), Err(RestoreError::InvalidInput(_))),
                "expected InvalidInput for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_parse_selection_huge_number_is_out_of_range() {
        let result = parse_selection("99999999999999999999999", 3);
        assert!(matches!(result, Err(RestoreError::OutOfRange { .. })));

        let result = parse_selection("-99999999999999999999999", 3);
        assert!(matches!(result, Err(RestoreError::OutOfRange { .. })));
    }

    #[test]
    fn test_choose_shows_menu_and_returns_index() {
        let (catalog, _temp) = catalog_of(3);
        let mut prompt = SelectionPrompt::new(ScriptedInput::silent("3\n"));

        assert_eq!(prompt.choose(&catalog).unwrap(), 2);

        let input = prompt.into_inner();
        assert_eq!(input.shown().len(), 1);
        assert!(input.shown()[0].contains("[3]"));
        assert!(input.shown()[0].contains("(1-3)"));
    }

    #[test]
    fn test_choose_rejects_text() {
        let (catalog, _temp) = catalog_of(2);
        let mut prompt = SelectionPrompt::new(ScriptedInput::silent("abc"));

        let err = prompt.choose(&catalog).unwrap_err();
        assert!(matches!(err, RestoreError::InvalidInput(ref s) if s == "abc"));
    }

    #[test]
    fn test_choose_rejects_zero() {
        let (catalog, _temp) = catalog_of(2);
        let mut prompt = SelectionPrompt::new(ScriptedInput::silent("0"));

        let err = prompt.choose(&catalog).unwrap_err();
        assert!(matches!(err, RestoreError::OutOfRange { selection: 0, max: 2 }));
    }

    struct FailingInput;

    impl InputSource for FailingInput {
        fn prompt(&mut self, _menu: &str) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed"))
        }
    }

    #[test]
    fn test_choose_reports_read_failure() {
        let (catalog, _temp) = catalog_of(1);
        let mut prompt = SelectionPrompt::new(FailingInput);

        let err = prompt.choose(&catalog).unwrap_err();
        assert!(matches!(err, RestoreError::Io(_)));
    }
}
