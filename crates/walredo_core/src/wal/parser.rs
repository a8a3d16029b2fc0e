//! Line parser for the textual log.

use crate::error::{CoreError, CoreResult};
use crate::types::TransactionId;
use crate::wal::record::LogRecord;
use std::collections::BTreeSet;
use walredo_storage::RowId;

const CHECKPOINT_KEYWORD: &str = "CKPT";

/// Parses a log using the default `<` `>` wrapper.
///
/// # Errors
///
/// Returns [`CoreError::Parse`] for the first malformed line.
pub fn parse_log(text: &str) -> CoreResult<Vec<LogRecord>> {
    LogParser::default().parse(text)
}

/// Turns raw log text into an ordered sequence of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogParser {
    open: char,
    close: char,
}

impl Default for LogParser {
    fn default() -> Self {
        Self::new('<', '>')
    }
}

impl LogParser {
    /// Creates a parser for lines wrapped in `open` ... `close`.
    #[must_use]
    pub const fn new(open: char, close: char) -> Self {
        Self { open, close }
    }

    /// Parses every non-blank line of `text`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Parse`] for the first malformed line.
    pub fn parse(&self, text: &str) -> CoreResult<Vec<LogRecord>> {
        let mut records = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if let Some(record) = self.parse_line(index + 1, line)? {
                records.push(record);
            }
        }
        tracing::debug!(records = records.len(), "log parsed");
        Ok(records)
    }

    /// Parses a single line. Returns `Ok(None)` for a blank line.
    ///
    /// `line_no` is only used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Parse`] if the line is not a valid record.
    pub fn parse_line(&self, line_no: usize, line: &str) -> CoreResult<Option<LogRecord>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let body = trimmed
            .strip_prefix(self.open)
            .and_then(|rest| rest.strip_suffix(self.close))
            .ok_or_else(|| {
                CoreError::parse(
                    line_no,
                    format!(
                        "expected record wrapped in `{}`...`{}`, got `{trimmed}`",
                        self.open, self.close
                    ),
                )
            })?
            .trim();

        let err = |what: &str| CoreError::parse(line_no, format!("{what} in `{trimmed}`"));

        let mut tokens = body.split_whitespace();
        let keyword = tokens.next().ok_or_else(|| err("empty record"))?;

        let record = match keyword {
            "start" | "commit" => {
                let txid = tokens
                    .next()
                    .ok_or_else(|| err("missing transaction id"))?;
                if tokens.next().is_some() {
                    return Err(err("unexpected trailing tokens"));
                }
                let txid = parse_txid(txid).map_err(|what| err(what))?;
                if keyword == "start" {
                    LogRecord::Start { txid }
                } else {
                    LogRecord::Commit { txid }
                }
            }
            "crash" => {
                if tokens.next().is_some() {
                    return Err(err("unexpected trailing tokens"));
                }
                LogRecord::Crash
            }
            _ if is_checkpoint(body) => {
                let active = parse_checkpoint_list(&body[CHECKPOINT_KEYWORD.len()..])
                    .map_err(|what| err(what))?;
                LogRecord::Checkpoint { active }
            }
            _ if body.contains(',') => parse_write(body).map_err(|what| err(what))?,
            _ => return Err(err("unrecognized record")),
        };

        Ok(Some(record))
    }
}

/// `CKPT` followed by nothing, whitespace or the opening parenthesis.
fn is_checkpoint(body: &str) -> bool {
    body.strip_prefix(CHECKPOINT_KEYWORD)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(|c: char| c == '(' || c.is_whitespace()))
}

/// Validates a transaction id token.
///
/// Ids are non-empty and contain no whitespace, commas or parentheses, so
/// they cannot swallow the fields of a write or a checkpoint list.
fn parse_txid(token: &str) -> Result<TransactionId, &'static str> {
    if token.is_empty() {
        return Err("missing transaction id");
    }
    if token.contains(|c: char| c.is_whitespace() || matches!(c, ',' | '(' | ')')) {
        return Err("invalid transaction id");
    }
    Ok(TransactionId::new(token))
}

/// Parses `(T1, T2)` into a set. `()` is the empty set.
fn parse_checkpoint_list(rest: &str) -> Result<BTreeSet<TransactionId>, &'static str> {
    let inner = rest
        .trim()
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or("malformed checkpoint list")?
        .trim();
    if inner.is_empty() {
        return Ok(BTreeSet::new());
    }
    inner.split(',').map(|id| parse_txid(id.trim())).collect()
}

/// Parses `txid,row,column,value`.
fn parse_write(body: &str) -> Result<LogRecord, &'static str> {
    let fields: Vec<&str> = body.split(',').map(str::trim).collect();
    let [txid, row, column, value] = fields.as_slice() else {
        return Err(if fields.len() < 4 {
            "missing write fields"
        } else {
            "too many write fields"
        });
    };

    let txid = parse_txid(txid)?;
    if column.is_empty() {
        return Err("missing column");
    }
    if value.is_empty() {
        return Err("missing value");
    }
    let row = row.parse::<u64>().map_err(|_| "invalid row id")?;

    Ok(LogRecord::Write {
        txid,
        row: RowId::new(row),
        column: (*column).to_string(),
        value: (*value).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> CoreResult<Option<LogRecord>> {
        LogParser::default().parse_line(1, text)
    }

    #[test]
    fn parses_every_record_kind() {
        let text = "<start T1>\n<T1,1,A,20>\n<commit T1>\n<CKPT (T2,T3)>\n<crash>\n";
        let records = parse_log(text).unwrap();
        assert_eq!(
            records,
            vec![
                LogRecord::start("T1"),
                LogRecord::write("T1", 1, "A", "20"),
                LogRecord::commit("T1"),
                LogRecord::checkpoint(["T2", "T3"]),
                LogRecord::Crash,
            ]
        );
    }

    #[test]
    fn blank_lines_skipped() {
        let records = parse_log("\n  \n<start T1>\n\n").unwrap();
        assert_eq!(records, vec![LogRecord::start("T1")]);
    }

    #[test]
    fn surrounding_whitespace_ignored() {
        assert_eq!(line("   < start  T9 >  ").unwrap(), Some(LogRecord::start("T9")));
        assert_eq!(
            line("<T1, 2 , B, 7>").unwrap(),
            Some(LogRecord::write("T1", 2, "B", "7"))
        );
    }

    #[test]
    fn empty_checkpoint() {
        assert_eq!(
            line("<CKPT ()>").unwrap(),
            Some(LogRecord::checkpoint(Vec::<String>::new()))
        );
        assert_eq!(
            line("<CKPT( )>").unwrap(),
            Some(LogRecord::checkpoint(Vec::<String>::new()))
        );
    }

    #[test]
    fn checkpoint_list_with_spaces() {
        assert_eq!(
            line("<CKPT (T1, T2 ,T3)>").unwrap(),
            Some(LogRecord::checkpoint(["T1", "T2", "T3"]))
        );
    }

    #[test]
    fn checkpoint_without_list_rejected() {
        assert!(matches!(line("<CKPT>"), Err(CoreError::Parse { .. })));
        assert!(matches!(line("<CKPT (T1,,T2)>"), Err(CoreError::Parse { .. })));
        assert!(matches!(line("<CKPT (T1>"), Err(CoreError::Parse { .. })));
    }

    #[test]
    fn write_starting_with_ckpt_is_a_write() {
        assert_eq!(
            line("<CKPTX,1,A,2>").unwrap(),
            Some(LogRecord::write("CKPTX", 1, "A", "2"))
        );
    }

    #[test]
    fn missing_write_field_rejected() {
        let err = parse_log("<start T1>\n<T1,1,A>\n").unwrap_err();
        match err {
            CoreError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("missing write fields"));
                assert!(message.contains("<T1,1,A>"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_write_value_rejected() {
        assert!(matches!(line("<T1,1,A,>"), Err(CoreError::Parse { .. })));
    }

    #[test]
    fn non_numeric_row_rejected() {
        assert!(matches!(line("<T1,x,A,5>"), Err(CoreError::Parse { .. })));
    }

    #[test]
    fn too_many_write_fields_rejected() {
        assert!(matches!(line("<T1,1,A,5,6>"), Err(CoreError::Parse { .. })));
    }

    #[test]
    fn start_without_id_rejected() {
        assert!(matches!(line("<start>"), Err(CoreError::Parse { .. })));
        assert!(matches!(line("<commit T1 T2>"), Err(CoreError::Parse { .. })));
    }

    #[test]
    fn start_with_comma_in_id_rejected() {
        let err = parse_log("<start T1,1,A,5>\n<T1,1,A,6>\n<commit T1>\n").unwrap_err();
        match err {
            CoreError::Parse { line, message } => {
                assert_eq!(line, 1);
                assert!(message.contains("invalid transaction id"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(line("<commit (T1)>"), Err(CoreError::Parse { .. })));
    }

    #[test]
    fn checkpoint_id_with_paren_rejected() {
        assert!(matches!(line("<CKPT (T1,(T2)>"), Err(CoreError::Parse { .. })));
        assert!(matches!(line("<CKPT (T1),T2)>"), Err(CoreError::Parse { .. })));
        assert!(matches!(line("<CKPT (T1 T2)>"), Err(CoreError::Parse { .. })));
    }

    #[test]
    fn write_id_with_paren_rejected() {
        assert!(matches!(line("<(T1,1,A,5>"), Err(CoreError::Parse { .. })));
    }

    #[test]
    fn missing_wrapper_rejected() {
        assert!(matches!(line("start T1"), Err(CoreError::Parse { .. })));
        assert!(matches!(line("<start T1"), Err(CoreError::Parse { .. })));
        assert!(matches!(line("<>"), Err(CoreError::Parse { .. })));
    }

    #[test]
    fn unrecognized_record_rejected() {
        assert!(matches!(line("<rollback T1>"), Err(CoreError::Parse { .. })));
        assert!(matches!(line("<crash now>"), Err(CoreError::Parse { .. })));
    }

    #[test]
    fn custom_delimiters() {
        let parser = LogParser::new('[', ']');
        assert_eq!(
            parser.parse("[start T1]\n[commit T1]").unwrap(),
            vec![LogRecord::start("T1"), LogRecord::commit("T1")]
        );
        assert!(parser.parse("<start T1>").is_err());
    }

    #[test]
    fn display_output_parses_back() {
        let records = vec![
            LogRecord::start("T1"),
            LogRecord::write("T1", 3, "B", "x"),
            LogRecord::checkpoint(["T1"]),
            LogRecord::commit("T1"),
            LogRecord::Crash,
        ];
        let text: String = records.iter().map(|r| format!("{r}\n")).collect();
        assert_eq!(parse_log(&text).unwrap(), records);
    }
}
