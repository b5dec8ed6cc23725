use serde::Serialize;

pub const DEFAULT_MAX_LINES_PER_SIDE: usize = 220;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    pub max_lines_per_side: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            max_lines_per_side: DEFAULT_MAX_LINES_PER_SIDE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffOp {
    Equal,
    Inserted,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub op: DiffOp,
    pub text: String,
}

impl DiffLine {
    fn new(op: DiffOp, text: &str) -> Self {
        Self {
            op,
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiffOutcome {
    /// Nothing to compare against, e.g. a record's first replay.
    NoBaseline,
    /// One side exceeded the line bound; the table was not built.
    TooLarge {
        previous_lines: usize,
        next_lines: usize,
        limit: usize,
    },
    Lines { lines: Vec<DiffLine> },
}

impl DiffOutcome {
    pub fn lines(&self) -> Option<&[DiffLine]> {
        match self {
            DiffOutcome::Lines { lines } => Some(lines),
            _ => None,
        }
    }

    pub fn has_changes(&self) -> bool {
        self.lines()
            .is_some_and(|lines| lines.iter().any(|line| line.op != DiffOp::Equal))
    }

    pub fn render(&self) -> String {
        match self {
            DiffOutcome::NoBaseline => "No previous response to compare against.".to_string(),
            DiffOutcome::TooLarge {
                previous_lines,
                next_lines,
                limit,
            } => format!(
                "Diff skipped: response too large ({previous_lines} vs {next_lines} lines, limit {limit} per side)."
            ),
            DiffOutcome::Lines { lines } => lines
                .iter()
                .map(|line| match line.op {
                    DiffOp::Equal => format!("  {}", line.text),
                    DiffOp::Inserted => format!("+ {}", line.text),
                    DiffOp::Deleted => format!("- {}", line.text),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Line diff of `previous` against `next` via a bounded LCS table.
///
/// The walk back from the bottom-right cell prefers an upward move
/// (`Deleted`) when both neighbours hold the same length.
pub fn compute_diff(previous: Option<&str>, next: &str, options: &DiffOptions) -> DiffOutcome {
    let previous = match previous {
        Some(text) if !text.is_empty() => normalize_line_endings(text),
        _ => return DiffOutcome::NoBaseline,
    };
    let next = normalize_line_endings(next);
    let a: Vec<&str> = previous.split('\n').collect();
    let b: Vec<&str> = next.split('\n').collect();

    let limit = options.max_lines_per_side;
    if a.len() > limit || b.len() > limit {
        return DiffOutcome::TooLarge {
            previous_lines: a.len(),
            next_lines: b.len(),
            limit,
        };
    }

    let (m, n) = (a.len(), b.len());
    let width = n + 1;
    let mut table = vec![0u32; (m + 1) * width];
    for i in 1..=m {
        for j in 1..=n {
            table[i * width + j] = if a[i - 1] == b[j - 1] {
                table[(i - 1) * width + j - 1] + 1
            } else {
                table[(i - 1) * width + j].max(table[i * width + j - 1])
            };
        }
    }

    let mut script = Vec::with_capacity(m + n);
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && a[i - 1] == b[j - 1] {
            script.push(DiffLine::new(DiffOp::Equal, b[j - 1]));
            i -= 1;
            j -= 1;
        } else if i > 0 && (j == 0 || table[(i - 1) * width + j] >= table[i * width + j - 1]) {
            script.push(DiffLine::new(DiffOp::Deleted, a[i - 1]));
            i -= 1;
        } else {
            script.push(DiffLine::new(DiffOp::Inserted, b[j - 1]));
            j -= 1;
        }
    }
    script.reverse();

    DiffOutcome::Lines { lines: script }
}
