use anyhow::Result;
use regex::Regex;
use std::collections::BTreeSet;

/// Pattern-based extraction of action items, decisions and speakers.
///
/// Every pattern runs line by line on the transcript with its `[mm:ss]`
/// prefixes removed, so a match never spans two segments.
pub struct MinutesExtractor {
    timestamp: Regex,
    action_item: Regex,
    decision: Regex,
    speaker: Regex,
    speaker_label: Regex,
}

impl MinutesExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            timestamp: Regex::new(r"\[[\d:]+\]")?,
            action_item: Regex::new(r"\b[A-Z][a-z]+\s(?:will|should|needs to|plan to)\s[^.]+")?,
            decision: Regex::new(r"\b(?:decided|agreed|approved|rejected|concluded)[^.]+")?,
            speaker: Regex::new(r"^([A-Za-z]+):")?,
            speaker_label: Regex::new(r"^[A-Za-z ]+:\s*")?,
        })
    }

    pub fn action_items(&self, transcript: &str) -> Vec<String> {
        self.find_all(&self.action_item, transcript)
    }

    pub fn decisions(&self, transcript: &str) -> Vec<String> {
        self.find_all(&self.decision, transcript)
    }

    pub fn participants(&self, transcript: &str) -> BTreeSet<String> {
        self.lines(transcript)
            .filter_map(|line| {
                self.speaker
                    .captures(&line)
                    .map(|caps| caps[1].to_string())
            })
            .collect()
    }

    fn find_all(&self, pattern: &Regex, transcript: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for line in self.lines(transcript) {
            for m in pattern.find_iter(&line) {
                let item = m.as_str().trim().to_string();
                if !item.is_empty() && !found.contains(&item) {
                    found.push(item);
                }
            }
        }
        found
    }

    /// Transcript text with timestamps and speaker labels removed, one line
    /// per segment. This is what summary providers see.
    pub fn clean(&self, transcript: &str) -> String {
        self.lines(transcript)
            .map(|line| self.speaker_label.replace(&line, "").trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn lines<'a>(&'a self, transcript: &'a str) -> impl Iterator<Item = String> + 'a {
        transcript.lines().filter_map(move |line| {
            let line = self.timestamp.replace_all(line, "");
            let line = line.trim();
            (!line.is_empty()).then(|| line.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_items_deduplicated_in_order() {
        let extractor = MinutesExtractor::new().unwrap();
        let transcript = "[00:01] Carol will book the room. Dave should review the draft.\n\
            [00:09] Carol will book the room.\n\
            [00:15] Erin needs to file the report";

        assert_eq!(
            extractor.action_items(transcript),
            vec![
                "Carol will book the room",
                "Dave should review the draft",
                "Erin needs to file the report",
            ]
        );
    }

    #[test]
    fn test_decisions() {
        let extractor = MinutesExtractor::new().unwrap();
        let transcript = "[00:00] The board approved the hire. Then we concluded early.";

        assert_eq!(
            extractor.decisions(transcript),
            vec!["approved the hire", "concluded early"]
        );
    }

    #[test]
    fn test_participants_after_timestamps() {
        let extractor = MinutesExtractor::new().unwrap();
        let transcript = "[00:00] Alice: hi\n\n[00:03] Bob: hello\n[00:04] Alice: again\nno speaker here";

        let participants: Vec<String> = extractor.participants(transcript).into_iter().collect();
        assert_eq!(participants, vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_nothing_found() {
        let extractor = MinutesExtractor::new().unwrap();
        let transcript = "[00:00] just some chatter about the weather";

        assert!(extractor.action_items(transcript).is_empty());
        assert!(extractor.decisions(transcript).is_empty());
        assert!(extractor.participants(transcript).is_empty());
    }

    #[test]
    fn test_clean_transcript() {
        let extractor = MinutesExtractor::new().unwrap();
        let transcript = "[00:00] Alice: Welcome.\n\n[01:02] Bob Smith: Thanks all.\n[01:10] No label here.";
        assert_eq!(
            extractor.clean(transcript),
            "Welcome.\nThanks all.\nNo label here."
        );
    }
}
