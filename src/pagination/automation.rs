//! External automation host used to ask a layout engine for page numbers.
//!
//! The host receives a keys file (`ordinal|snippet` per line), searches the
//! document for each snippet in order and writes `ordinal|page` lines to a
//! results file.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::model::PageMap;

/// Longest snippet handed to the host, in characters.
pub const SNIPPET_CHARS: usize = 150;

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// How long a host may run for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// Allowance for every document
    pub base: Duration,

    /// Additional allowance per megabyte of file size
    pub per_megabyte: Duration,
}

impl TimeoutPolicy {
    /// Timeout for a file of `file_size` bytes.
    pub fn for_size(&self, file_size: u64) -> Duration {
        let megabytes = file_size as f64 / BYTES_PER_MEGABYTE;
        let extra = self.per_megabyte.as_secs_f64() * megabytes;
        Duration::from_secs((self.base.as_secs_f64() + extra) as u64)
    }

    /// Timeout for a file on disk; unreadable metadata counts as empty.
    pub fn for_file(&self, path: &Path) -> Duration {
        self.for_size(fs::metadata(path).map(|m| m.len()).unwrap_or(0))
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(60),
            per_megabyte: Duration::from_secs(30),
        }
    }
}

/// The process that performs the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutomationHost {
    /// Microsoft Word driven by a generated VBScript under `cscript`
    WordScript,

    /// A program invoked as `<program> <document> <keys-file> <results-file>`
    Helper { program: PathBuf },
}

impl fmt::Display for AutomationHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutomationHost::WordScript => write!(f, "Word"),
            AutomationHost::Helper { program } => write!(f, "{}", program.display()),
        }
    }
}

/// Runs one host process per lookup, inside a private temporary directory.
#[derive(Debug, Clone)]
pub struct Automation {
    host: AutomationHost,
    poll_interval: Duration,
}

impl Automation {
    /// Create an automation for the given host.
    pub fn new(host: AutomationHost) -> Self {
        Self {
            host,
            poll_interval: Duration::from_millis(50),
        }
    }

    /// Automation through Microsoft Word.
    pub fn word() -> Self {
        Self::new(AutomationHost::WordScript)
    }

    /// Automation through an external helper program.
    pub fn helper(program: impl Into<PathBuf>) -> Self {
        Self::new(AutomationHost::Helper {
            program: program.into(),
        })
    }

    /// Set how often the child process is polled.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn host(&self) -> &AutomationHost {
        &self.host
    }

    /// Look up the page of every snippet in `document`.
    ///
    /// Snippets are searched in ordinal order. The temporary directory holding
    /// the keys, results, script and stderr files is removed when this returns,
    /// whatever the outcome.
    pub fn lookup(
        &self,
        document: &Path,
        snippets: &BTreeMap<usize, String>,
        timeout: Duration,
    ) -> Result<PageMap> {
        if snippets.is_empty() {
            return Ok(PageMap::new());
        }

        let workspace = tempfile::Builder::new().prefix("unquote-").tempdir()?;
        let keys = workspace.path().join("keys.txt");
        let results = workspace.path().join("results.txt");
        let stderr_path = workspace.path().join("stderr.txt");
        File::create(&results)?;

        let mut command = match &self.host {
            AutomationHost::WordScript => {
                fs::write(&keys, encode_utf16le(&format_search_keys(snippets, true)))?;
                let script = workspace.path().join("lookup.vbs");
                fs::write(&script, word_script(&absolute(document)?, &keys, &results))?;
                let mut command = Command::new("cscript");
                command.arg("//NoLogo").arg(&script);
                command
            }
            AutomationHost::Helper { program } => {
                fs::write(&keys, format_search_keys(snippets, false))?;
                let mut command = Command::new(program);
                command.arg(document).arg(&keys).arg(&results);
                command
            }
        };
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(File::create(&stderr_path)?));

        let mut child = command.spawn().map_err(|e| {
            Error::Automation(format!("failed to start {}: {}", self.host, e))
        })?;

        let status = wait_with_timeout(&mut child, timeout, self.poll_interval);
        relay_stderr(&stderr_path);

        match status? {
            Some(status) => {
                if !status.success() {
                    log::debug!("{} exited with {}", self.host, status);
                }
            }
            None => {
                self.terminate_host();
                return Err(Error::Timeout(timeout));
            }
        }

        let raw = fs::read(&results)?;
        Ok(parse_results(&String::from_utf8_lossy(&raw)))
    }

    /// Clean up processes the host may have left behind after a kill.
    fn terminate_host(&self) {
        if self.host != AutomationHost::WordScript {
            return;
        }
        let outcome = Command::new("taskkill")
            .args(["/F", "/IM", "WINWORD.EXE"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if let Err(e) = outcome {
            log::debug!("Could not terminate Word: {}", e);
        }
    }
}

/// Wait for `child`, killing it once `timeout` elapses.
///
/// Returns `Ok(None)` on timeout.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Option<ExitStatus>> {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => {
                if started.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Ok(None);
                }
                thread::sleep(poll_interval);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Automation(format!("process wait failed: {}", e)));
            }
        }
    }
}

fn relay_stderr(path: &Path) {
    let Ok(raw) = fs::read(path) else {
        return;
    };
    for line in String::from_utf8_lossy(&raw).lines() {
        let line = line.trim();
        if !line.is_empty() {
            log::debug!("  host: {}", line);
        }
    }
}

/// Cut a paragraph's raw text down to a search snippet.
///
/// Returns `None` for blank paragraphs.
pub fn search_snippet(raw_text: &str) -> Option<String> {
    let snippet: String = raw_text
        .trim()
        .chars()
        .take(SNIPPET_CHARS)
        .map(|c| if matches!(c, '|' | '\r' | '\n') { ' ' } else { c })
        .collect();
    (!snippet.trim().is_empty()).then_some(snippet)
}

/// Render the keys file: `ordinal|snippet` per line, in ordinal order.
///
/// Word treats `^` as a control prefix in search text, so it is doubled
/// for that host.
pub fn format_search_keys(snippets: &BTreeMap<usize, String>, for_word: bool) -> String {
    let line_end = if for_word { "\r\n" } else { "\n" };
    snippets
        .iter()
        .map(|(ordinal, snippet)| {
            let text = if for_word {
                snippet.replace('^', "^^")
            } else {
                snippet.clone()
            };
            format!("{}|{}{}", ordinal, text, line_end)
        })
        .collect()
}

/// Parse a results file. Malformed lines are skipped.
pub fn parse_results(content: &str) -> PageMap {
    content
        .lines()
        .map(|line| line.trim().trim_start_matches('\u{FEFF}'))
        .filter_map(|line| {
            let mut parts = line.split('|');
            let ordinal = parts.next()?.trim().parse::<usize>().ok()?;
            let page = parts.next()?.trim().parse::<u32>().ok()?;
            Some((ordinal, page))
        })
        .collect()
}

fn encode_utf16le(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
    bytes
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn vbs_string(path: &Path) -> String {
    path.display().to_string().replace('"', "\"\"")
}

/// VBScript that opens `document` read-only in Word and records the adjusted
/// page number (`wdActiveEndAdjustedPageNumber`) of each snippet match.
fn word_script(document: &Path, keys: &Path, results: &Path) -> String {
    format!(
        r#"Dim word, fso, inputFile, outputFile, doc, rng
Dim line, pipePos, paraIdx, searchText, lastPos

Set fso = CreateObject("Scripting.FileSystemObject")
Set word = CreateObject("Word.Application")
word.Visible = False
word.DisplayAlerts = 0

Set inputFile = fso.OpenTextFile("{keys}", 1, False, -1)
Set outputFile = fso.CreateTextFile("{results}", True, False)

WScript.StdErr.WriteLine "Opening document..."
Set doc = word.Documents.Open("{document}", False, True)
WScript.StdErr.WriteLine "Opened, paragraphs: " & doc.Paragraphs.Count

lastPos = 0
Do While Not inputFile.AtEndOfStream
    line = inputFile.ReadLine()
    pipePos = InStr(line, "|")
    If pipePos > 0 Then
        paraIdx = Left(line, pipePos - 1)
        searchText = Mid(line, pipePos + 1)
        If Len(searchText) > 0 Then
            Set rng = doc.Content.Duplicate
            rng.SetRange lastPos, doc.Content.End
            rng.Find.ClearFormatting
            rng.Find.Text = searchText
            rng.Find.Forward = True
            rng.Find.Wrap = 0
            rng.Find.MatchWildcards = False
            rng.Find.MatchCase = True

            On Error Resume Next
            rng.Find.Execute
            If Err.Number = 0 And rng.Find.Found Then
                outputFile.WriteLine paraIdx & "|" & rng.Information(1)
                lastPos = rng.End
            Else
                WScript.StdErr.WriteLine "Not found: " & paraIdx
            End If
            Err.Clear
            On Error GoTo 0
        End If
    End If
Loop

doc.Close False
inputFile.Close
outputFile.Close
word.Quit
WScript.StdErr.WriteLine "Done"
"#,
        keys = vbs_string(keys),
        results = vbs_string(results),
        document = vbs_string(document),
    )
}
