// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

/// Match `text` against a pattern where `*` stands for any run of characters.
///
/// Supports any number of wildcards, e.g. `get*`, `*Account`, `*load*`, `find*By*`.
pub fn simple_match(pattern: &str, text: &str) -> bool {
	let pattern = pattern.as_bytes();
	let text = text.as_bytes();

	let (mut p, mut t) = (0, 0);
	// position after the last `*` and the text position it was tried against
	let mut backtrack: Option<(usize, usize)> = None;

	while t < text.len() {
		if p < pattern.len() && pattern[p] == b'*' {
			p += 1;
			backtrack = Some((p, t));
		} else if p < pattern.len() && pattern[p] == text[t] {
			p += 1;
			t += 1;
		} else if let Some((star_p, star_t)) = backtrack {
			p = star_p;
			t = star_t + 1;
			backtrack = Some((star_p, star_t + 1));
		} else {
			return false;
		}
	}

	pattern[p..].iter().all(|&c| c == b'*')
}

#[cfg(test)]
mod tests {
	use super::simple_match;

	#[test]
	fn test_exact() {
		assert!(simple_match("transfer", "transfer"));
		assert!(!simple_match("transfer", "transfers"));
		assert!(!simple_match("transfers", "transfer"));
	}

	#[test]
	fn test_wildcards() {
		assert!(simple_match("*", "anything"));
		assert!(simple_match("*", ""));
		assert!(simple_match("get*", "getBalance"));
		assert!(simple_match("get*", "get"));
		assert!(!simple_match("get*", "forget"));
		assert!(simple_match("*Balance", "getBalance"));
		assert!(simple_match("*Bal*", "getBalanceFor"));
		assert!(simple_match("find*By*", "findAccountByOwner"));
		assert!(!simple_match("find*By*", "findAccount"));
		assert!(simple_match("a*b*c", "aXbYbZc"));
	}
}
