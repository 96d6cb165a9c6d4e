//! A small subset of CSS selectors, enough for scoped element queries.

use super::{NodeId, Tree};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SelectorList(Vec<Complex>);

/// Compounds left to right, with `combinators[i]` sitting between `compounds[i]` and `compounds[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
	compounds: Vec<Compound>,
	combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
	Descendant,
	Child,
}

type Compound = Vec<Simple>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Simple {
	Universal,
	Type(String),
	Id(String),
	Class(String),
	Attribute { name: String, matcher: Option<AttributeMatcher> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttributeMatcher {
	/// `=`
	Exact(String),
	/// `~=`
	Includes(String),
	/// `^=`
	Prefix(String),
	/// `$=`
	Suffix(String),
	/// `*=`
	Substring(String),
}

impl AttributeMatcher {
	fn matches(&self, value: &str) -> bool {
		match self {
			Self::Exact(expected) => value == expected,
			Self::Includes(expected) => value.split_ascii_whitespace().any(|word| word == expected),
			Self::Prefix(expected) => !expected.is_empty() && value.starts_with(expected.as_str()),
			Self::Suffix(expected) => !expected.is_empty() && value.ends_with(expected.as_str()),
			Self::Substring(expected) => !expected.is_empty() && value.contains(expected.as_str()),
		}
	}
}

fn syntax_error(selector: &str) -> Error {
	Error::host("querySelector", format!("SyntaxError: {:?} is not a valid selector", selector))
}

impl SelectorList {
	pub(super) fn parse(selector: &str) -> Result<Self> {
		let mut parser = Parser { input: selector, pos: 0 };
		let mut list = Vec::new();
		loop {
			list.push(parser.complex().ok_or_else(|| syntax_error(selector))?);
			parser.skip_whitespace();
			match parser.peek() {
				None => break,
				Some(',') => parser.pos += 1,
				Some(_) => return Err(syntax_error(selector)),
			}
		}
		Ok(Self(list))
	}

	pub(super) fn matches(&self, tree: &Tree, id: NodeId) -> bool {
		self.0.iter().any(|complex| complex.matches(tree, id, complex.compounds.len() - 1))
	}
}

impl Complex {
	fn matches(&self, tree: &Tree, id: NodeId, index: usize) -> bool {
		if !matches_compound(&self.compounds[index], tree, id) {
			return false;
		}
		if index == 0 {
			return true;
		}
		match self.combinators[index - 1] {
			Combinator::Child => tree.parent_of(id).map_or(false, |parent| self.matches(tree, parent, index - 1)),
			Combinator::Descendant => {
				let mut ancestor = tree.parent_of(id);
				while let Some(current) = ancestor {
					if self.matches(tree, current, index - 1) {
						return true;
					}
					ancestor = tree.parent_of(current);
				}
				false
			}
		}
	}
}

fn matches_compound(compound: &[Simple], tree: &Tree, id: NodeId) -> bool {
	let element = match tree.get(id) {
		Some(element) if !element.is_document => element,
		_ => return false,
	};
	compound.iter().all(|simple| match simple {
		Simple::Universal => true,
		Simple::Type(tag) => element.tag.eq_ignore_ascii_case(tag),
		Simple::Id(expected) => element.attribute("id") == Some(expected.as_str()),
		Simple::Class(class) => element.attribute("class").map_or(false, |classes| classes.split_ascii_whitespace().any(|c| c == class)),
		Simple::Attribute { name, matcher } => match (element.attribute(name), matcher) {
			(None, _) => false,
			(Some(_), None) => true,
			(Some(value), Some(matcher)) => matcher.matches(value),
		},
	})
}

struct Parser<'a> {
	input: &'a str,
	pos: usize,
}

impl<'a> Parser<'a> {
	fn peek(&self) -> Option<char> {
		self.input[self.pos..].chars().next()
	}

	fn bump(&mut self) -> Option<char> {
		let c = self.peek()?;
		self.pos += c.len_utf8();
		Some(c)
	}

	fn eat(&mut self, expected: char) -> bool {
		if self.peek() == Some(expected) {
			self.pos += expected.len_utf8();
			true
		} else {
			false
		}
	}

	/// Returns whether any whitespace was skipped.
	fn skip_whitespace(&mut self) -> bool {
		let start = self.pos;
		while self.peek().map_or(false, |c| c.is_ascii_whitespace()) {
			self.pos += 1;
		}
		self.pos != start
	}

	fn complex(&mut self) -> Option<Complex> {
		self.skip_whitespace();
		let mut compounds = vec![self.compound()?];
		let mut combinators = Vec::new();
		loop {
			let had_whitespace = self.skip_whitespace();
			let combinator = match self.peek() {
				None | Some(',') => break,
				Some('>') => {
					self.pos += 1;
					self.skip_whitespace();
					Combinator::Child
				}
				Some(_) if had_whitespace => Combinator::Descendant,
				Some(_) => return None,
			};
			combinators.push(combinator);
			compounds.push(self.compound()?);
		}
		Some(Complex { compounds, combinators })
	}

	fn compound(&mut self) -> Option<Compound> {
		let mut compound = Vec::new();
		if self.eat('*') {
			compound.push(Simple::Universal)
		} else if let Some(tag) = self.identifier() {
			compound.push(Simple::Type(tag))
		}
		loop {
			match self.peek() {
				Some('#') => {
					self.pos += 1;
					compound.push(Simple::Id(self.identifier()?))
				}
				Some('.') => {
					self.pos += 1;
					compound.push(Simple::Class(self.identifier()?))
				}
				Some('[') => {
					self.pos += 1;
					compound.push(self.attribute()?)
				}
				_ => break,
			}
		}
		if compound.is_empty() {
			None
		} else {
			Some(compound)
		}
	}

	fn attribute(&mut self) -> Option<Simple> {
		self.skip_whitespace();
		let name = self.identifier()?;
		self.skip_whitespace();
		if self.eat(']') {
			return Some(Simple::Attribute { name, matcher: None });
		}

		let operator = match self.bump()? {
			'=' => None,
			c @ ('~' | '^' | '$' | '*') if self.eat('=') => Some(c),
			_ => return None,
		};
		self.skip_whitespace();
		let value = match self.peek()? {
			quote @ ('"' | '\'') => {
				self.pos += 1;
				let end = self.input[self.pos..].find(quote)?;
				let value = self.input[self.pos..self.pos + end].to_owned();
				self.pos += end + 1;
				value
			}
			_ => self.identifier()?,
		};
		self.skip_whitespace();
		if !self.eat(']') {
			return None;
		}

		let matcher = match operator {
			None => AttributeMatcher::Exact(value),
			Some('~') => AttributeMatcher::Includes(value),
			Some('^') => AttributeMatcher::Prefix(value),
			Some('$') => AttributeMatcher::Suffix(value),
			Some(_) => AttributeMatcher::Substring(value),
		};
		Some(Simple::Attribute { name, matcher: Some(matcher) })
	}

	fn identifier(&mut self) -> Option<String> {
		let start = self.pos;
		while self.peek().map_or(false, |c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()) {
			self.bump();
		}
		let identifier = &self.input[start..self.pos];
		if identifier.is_empty() || identifier.starts_with(|c: char| c.is_ascii_digit()) {
			self.pos = start;
			None
		} else {
			Some(identifier.to_owned())
		}
	}
}
