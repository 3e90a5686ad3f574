//! Interactive keyword editing commands

pub const HELP: &str = "Edit keywords: '+keyword' adds, '-N' removes, empty line continues";

/// One line of user input while editing keywords
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// Append a keyword
    Add(String),
    /// Remove by 0-based index (typed 1-based)
    Remove(usize),
    /// Proceed to ranking
    Done,
}

impl EditCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(EditCommand::Done);
        }
        if let Some(keyword) = line.strip_prefix('+') {
            return Ok(EditCommand::Add(keyword.trim().to_string()));
        }
        if let Some(position) = line.strip_prefix('-') {
            let position: usize = position
                .trim()
                .parse()
                .map_err(|_| format!("'{}' is not a keyword number", position.trim()))?;
            return position
                .checked_sub(1)
                .map(EditCommand::Remove)
                .ok_or_else(|| "Keyword numbers start at 1".to_string());
        }
        Err(format!("Unrecognized command '{}'. {}", line, HELP))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        assert_eq!(
            EditCommand::parse("+ papel toalha "),
            Ok(EditCommand::Add("papel toalha".to_string()))
        );
    }

    #[test]
    fn test_parse_remove_is_one_based() {
        assert_eq!(EditCommand::parse("-2"), Ok(EditCommand::Remove(1)));
        assert!(EditCommand::parse("-0").is_err());
        assert!(EditCommand::parse("-two").is_err());
    }

    #[test]
    fn test_parse_done() {
        assert_eq!(EditCommand::parse(""), Ok(EditCommand::Done));
        assert_eq!(EditCommand::parse("   "), Ok(EditCommand::Done));
    }

    #[test]
    fn test_parse_unknown() {
        assert!(EditCommand::parse("papel").is_err());
    }
}
