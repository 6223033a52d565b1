use chatstory_events::CharacterId;
use serde::{Deserialize, Serialize};

/// Suffix appended to the joined names, for one or many typists alike
pub const TYPING_SUFFIX: &str = " is typing...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Typist {
	pub character_id: CharacterId,
	pub name: String,
}

/// Insertion-ordered set of characters currently typing, keyed by character id
#[derive(Debug, Clone, Default)]
pub struct TypingTracker {
	typists: Vec<Typist>,
}

impl TypingTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns false when the character is already typing
	pub fn add(&mut self, character_id: &CharacterId, name: &str) -> bool {
		if self.contains(character_id) {
			return false;
		}
		self.typists.push(Typist {
			character_id: character_id.clone(),
			name: name.to_string(),
		});
		true
	}

	/// Returns false when the character was not typing
	pub fn remove(&mut self, character_id: &CharacterId) -> bool {
		let before = self.typists.len();
		self.typists.retain(|t| &t.character_id != character_id);
		self.typists.len() != before
	}

	pub fn contains(&self, character_id: &CharacterId) -> bool {
		self.typists.iter().any(|t| &t.character_id == character_id)
	}

	pub fn clear(&mut self) {
		self.typists.clear();
	}

	pub fn len(&self) -> usize {
		self.typists.len()
	}

	pub fn is_empty(&self) -> bool {
		self.typists.is_empty()
	}

	pub fn names(&self) -> Vec<String> {
		self.typists.iter().map(|t| t.name.clone()).collect()
	}

	/// `None` when nobody is typing, otherwise "A, B is typing..."
	pub fn indicator_text(&self) -> Option<String> {
		if self.typists.is_empty() {
			return None;
		}
		let names: Vec<&str> = self.typists.iter().map(|t| t.name.as_str()).collect();
		Some(format!("{}{}", names.join(", "), TYPING_SUFFIX))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn duplicate_start_is_a_no_op() {
		let mut tracker = TypingTracker::new();
		let ana = CharacterId::from(1);

		assert!(tracker.add(&ana, "Ana"));
		assert!(!tracker.add(&ana, "Ana again"));
		assert_eq!(tracker.len(), 1);
		assert_eq!(tracker.indicator_text().as_deref(), Some("Ana is typing..."));
	}

	#[test]
	fn names_keep_insertion_order() {
		let mut tracker = TypingTracker::new();
		tracker.add(&CharacterId::from(2), "Ben");
		tracker.add(&CharacterId::from(1), "Ana");

		assert_eq!(tracker.indicator_text().as_deref(), Some("Ben, Ana is typing..."));

		assert!(tracker.remove(&CharacterId::from(2)));
		assert_eq!(tracker.names(), vec!["Ana".to_string()]);
	}

	#[test]
	fn empty_set_has_no_indicator() {
		let mut tracker = TypingTracker::new();
		assert_eq!(tracker.indicator_text(), None);
		assert!(!tracker.remove(&CharacterId::from(9)));

		tracker.add(&CharacterId::default(), "Unknown");
		tracker.clear();
		assert!(tracker.is_empty());
		assert_eq!(tracker.indicator_text(), None);
	}
}
