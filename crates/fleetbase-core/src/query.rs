//! Paging, sorting and filtering of catalog listings.
//!
//! A [`ListParams`] query string is turned into a [`PageRequest`] which is
//! validated against the fields a [`Queryable`] entity exposes. Applying the
//! request yields the total number of matches and one ordered window; ties of
//! the requested sort order are always broken by ascending id, so windows of
//! consecutive requests concatenate without duplicates or gaps.
//!
//! Filters use a subset of RSQL:
//!
//! - comparisons: `==`, `!=`, `=lt=`, `=le=`, `=gt=`, `=ge=`, `=in=(a,b)`, `=out=(a,b)`
//! - `;` is AND, `,` is OR (AND binds tighter), parentheses group
//! - values may be quoted with `'` or `"`; `*` is a wildcard in `==` and `!=`
//! - string comparisons ignore case

use serde::Deserialize;
use std::cmp::Ordering;

use fleetbase_types::meta_adapter::{DistSetType, ModuleType};

use crate::prelude::*;

pub const MAX_PAGE_LIMIT: u32 = 500;
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Raw list query parameters as received by the binding
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
	pub offset: Option<u64>,
	pub limit: Option<u32>,
	pub sort: Option<String>,
	pub q: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
	Integer,
	Text,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
	Int(i64),
	Text(Option<&'a str>),
}

/// An entity that can be listed through a [`PageRequest`]
pub trait Queryable {
	/// Queryable field names with their kinds
	const FIELDS: &'static [(&'static str, FieldKind)];

	fn id(&self) -> i64;

	/// Value of one of `FIELDS`
	fn field(&self, name: &str) -> FieldValue<'_>;
}

impl Queryable for ModuleType {
	const FIELDS: &'static [(&'static str, FieldKind)] = &[
		("id", FieldKind::Integer),
		("key", FieldKind::Text),
		("name", FieldKind::Text),
		("description", FieldKind::Text),
		("maxAssignments", FieldKind::Integer),
	];

	fn id(&self) -> i64 {
		self.smt_id
	}

	fn field(&self, name: &str) -> FieldValue<'_> {
		match name {
			"id" => FieldValue::Int(self.smt_id),
			"key" => FieldValue::Text(Some(&self.key)),
			"name" => FieldValue::Text(Some(&self.name)),
			"description" => FieldValue::Text(self.description.as_deref()),
			"maxAssignments" => FieldValue::Int(i64::from(self.max_assignments)),
			_ => FieldValue::Text(None),
		}
	}
}

impl Queryable for DistSetType {
	const FIELDS: &'static [(&'static str, FieldKind)] = &[
		("id", FieldKind::Integer),
		("key", FieldKind::Text),
		("name", FieldKind::Text),
		("description", FieldKind::Text),
	];

	fn id(&self) -> i64 {
		self.dst_id
	}

	fn field(&self, name: &str) -> FieldValue<'_> {
		match name {
			"id" => FieldValue::Int(self.dst_id),
			"key" => FieldValue::Text(Some(&self.key)),
			"name" => FieldValue::Text(Some(&self.name)),
			"description" => FieldValue::Text(self.description.as_deref()),
			_ => FieldValue::Text(None),
		}
	}
}

fn lookup_field<T: Queryable>(name: &str) -> FbResult<(&'static str, FieldKind)> {
	T::FIELDS
		.iter()
		.find(|(field, _)| field.eq_ignore_ascii_case(name))
		.copied()
		.ok_or_else(|| Error::InvalidQuery(format!("unknown field '{}'", name)))
}

// Sorting //
//*********//
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
	Asc,
	Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
	pub field: &'static str,
	pub direction: SortDirection,
}

/// Parse `field[:ASC|DESC],...`
pub fn parse_sort<T: Queryable>(text: &str) -> FbResult<Vec<SortField>> {
	let mut sort = Vec::new();
	for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
		let (name, direction) = match part.split_once(':') {
			Some((name, dir)) => {
				let direction = match dir.trim().to_ascii_lowercase().as_str() {
					"asc" => SortDirection::Asc,
					"desc" => SortDirection::Desc,
					_ => {
						return Err(Error::InvalidQuery(format!(
							"invalid sort direction '{}'",
							dir.trim()
						)));
					}
				};
				(name.trim(), direction)
			}
			None => (part, SortDirection::Asc),
		};
		let (field, _) = lookup_field::<T>(name)?;
		sort.push(SortField { field, direction });
	}
	Ok(sort)
}

fn compare_values(a: &FieldValue<'_>, b: &FieldValue<'_>) -> Ordering {
	match (a, b) {
		(FieldValue::Int(a), FieldValue::Int(b)) => a.cmp(b),
		(FieldValue::Text(a), FieldValue::Text(b)) => match (a, b) {
			(Some(a), Some(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
			(a, b) => a.is_some().cmp(&b.is_some()),
		},
		(FieldValue::Int(_), FieldValue::Text(_)) => Ordering::Less,
		(FieldValue::Text(_), FieldValue::Int(_)) => Ordering::Greater,
	}
}

// Filtering //
//***********//
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
	Eq,
	Ne,
	Lt,
	Le,
	Gt,
	Ge,
	In,
	Out,
}

/// Typed comparison operand; text is stored lowercased
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
	Int(i64),
	Text(Box<str>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
	And(Vec<Filter>),
	Or(Vec<Filter>),
	Compare { field: &'static str, op: CompareOp, operands: Vec<Operand> },
}

impl Filter {
	pub fn parse<T: Queryable>(text: &str) -> FbResult<Filter> {
		let mut parser = FilterParser { chars: text.chars().collect(), pos: 0 };
		let filter = parser.parse_or::<T>()?;
		parser.skip_ws();
		if let Some(c) = parser.peek() {
			return Err(parser.error(&format!("unexpected '{}'", c)));
		}
		Ok(filter)
	}

	pub fn matches<T: Queryable>(&self, item: &T) -> bool {
		match self {
			Filter::And(filters) => filters.iter().all(|f| f.matches(item)),
			Filter::Or(filters) => filters.iter().any(|f| f.matches(item)),
			Filter::Compare { field, op, operands } => {
				let value = item.field(field);
				let first = operands.first();
				match op {
					CompareOp::Eq => first.is_some_and(|o| equals(&value, o, true)),
					CompareOp::Ne => !first.is_some_and(|o| equals(&value, o, true)),
					CompareOp::In => operands.iter().any(|o| equals(&value, o, false)),
					CompareOp::Out => !operands.iter().any(|o| equals(&value, o, false)),
					CompareOp::Lt => ordering(&value, first) == Some(Ordering::Less),
					CompareOp::Le => {
						matches!(ordering(&value, first), Some(Ordering::Less | Ordering::Equal))
					}
					CompareOp::Gt => ordering(&value, first) == Some(Ordering::Greater),
					CompareOp::Ge => {
						matches!(ordering(&value, first), Some(Ordering::Greater | Ordering::Equal))
					}
				}
			}
		}
	}
}

fn equals(value: &FieldValue<'_>, operand: &Operand, wildcard: bool) -> bool {
	match (value, operand) {
		(FieldValue::Int(a), Operand::Int(b)) => a == b,
		(FieldValue::Text(Some(s)), Operand::Text(pattern)) => {
			let s = s.to_lowercase();
			if wildcard && pattern.contains('*') {
				wildcard_match(pattern, &s)
			} else {
				**pattern == *s
			}
		}
		_ => false,
	}
}

fn ordering(value: &FieldValue<'_>, operand: Option<&Operand>) -> Option<Ordering> {
	match (value, operand?) {
		(FieldValue::Int(a), Operand::Int(b)) => Some(a.cmp(b)),
		(FieldValue::Text(Some(s)), Operand::Text(b)) => Some(s.to_lowercase().as_str().cmp(b)),
		_ => None,
	}
}

fn wildcard_match(pattern: &str, text: &str) -> bool {
	let pattern: Vec<char> = pattern.chars().collect();
	let text: Vec<char> = text.chars().collect();
	let (mut p, mut t) = (0, 0);
	// Position of the last '*' and the text position it currently absorbs up to
	let mut star: Option<(usize, usize)> = None;

	while t < text.len() {
		match pattern.get(p) {
			Some('*') => {
				star = Some((p, t));
				p += 1;
			}
			Some(c) if *c == text[t] => {
				p += 1;
				t += 1;
			}
			_ => match star {
				Some((sp, st)) => {
					p = sp + 1;
					t = st + 1;
					star = Some((sp, st + 1));
				}
				None => return false,
			},
		}
	}
	pattern[p..].iter().all(|c| *c == '*')
}

struct FilterParser {
	chars: Vec<char>,
	pos: usize,
}

impl FilterParser {
	fn peek(&self) -> Option<char> {
		self.chars.get(self.pos).copied()
	}

	fn skip_ws(&mut self) {
		while self.peek().is_some_and(char::is_whitespace) {
			self.pos += 1;
		}
	}

	fn eat(&mut self, c: char) -> bool {
		self.skip_ws();
		if self.peek() == Some(c) {
			self.pos += 1;
			true
		} else {
			false
		}
	}

	fn error(&self, msg: &str) -> Error {
		Error::InvalidQuery(format!("{} at position {}", msg, self.pos))
	}

	fn parse_or<T: Queryable>(&mut self) -> FbResult<Filter> {
		let mut terms = vec![self.parse_and::<T>()?];
		while self.eat(',') {
			terms.push(self.parse_and::<T>()?);
		}
		Ok(if terms.len() == 1 { terms.remove(0) } else { Filter::Or(terms) })
	}

	fn parse_and<T: Queryable>(&mut self) -> FbResult<Filter> {
		let mut terms = vec![self.parse_term::<T>()?];
		while self.eat(';') {
			terms.push(self.parse_term::<T>()?);
		}
		Ok(if terms.len() == 1 { terms.remove(0) } else { Filter::And(terms) })
	}

	fn parse_term<T: Queryable>(&mut self) -> FbResult<Filter> {
		if self.eat('(') {
			let inner = self.parse_or::<T>()?;
			if !self.eat(')') {
				return Err(self.error("expected ')'"));
			}
			return Ok(inner);
		}
		self.parse_comparison::<T>()
	}

	fn parse_comparison<T: Queryable>(&mut self) -> FbResult<Filter> {
		self.skip_ws();
		let start = self.pos;
		while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
			self.pos += 1;
		}
		if start == self.pos {
			return Err(self.error("expected field name"));
		}
		let name: String = self.chars[start..self.pos].iter().collect();
		let (field, kind) = lookup_field::<T>(&name)?;

		let op = self.parse_operator()?;
		let raw = if matches!(op, CompareOp::In | CompareOp::Out) {
			if !self.eat('(') {
				return Err(self.error("expected '(' after list operator"));
			}
			let mut values = vec![self.parse_value()?];
			while self.eat(',') {
				values.push(self.parse_value()?);
			}
			if !self.eat(')') {
				return Err(self.error("expected ')'"));
			}
			values
		} else {
			vec![self.parse_value()?]
		};

		let operands = raw
			.into_iter()
			.map(|v| match kind {
				FieldKind::Integer => v.parse::<i64>().map(Operand::Int).map_err(|_| {
					Error::InvalidQuery(format!("field '{}' expects an integer, got '{}'", field, v))
				}),
				FieldKind::Text => Ok(Operand::Text(v.to_lowercase().into())),
			})
			.collect::<FbResult<Vec<_>>>()?;

		Ok(Filter::Compare { field, op, operands })
	}

	fn parse_operator(&mut self) -> FbResult<CompareOp> {
		self.skip_ws();
		match (self.peek(), self.chars.get(self.pos + 1).copied()) {
			(Some('='), Some('=')) => {
				self.pos += 2;
				Ok(CompareOp::Eq)
			}
			(Some('!'), Some('=')) => {
				self.pos += 2;
				Ok(CompareOp::Ne)
			}
			(Some('='), _) => {
				self.pos += 1;
				let start = self.pos;
				while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
					self.pos += 1;
				}
				let name: String = self.chars[start..self.pos].iter().collect();
				if self.peek() != Some('=') {
					return Err(self.error("unterminated operator"));
				}
				self.pos += 1;
				match name.to_ascii_lowercase().as_str() {
					"lt" => Ok(CompareOp::Lt),
					"le" => Ok(CompareOp::Le),
					"gt" => Ok(CompareOp::Gt),
					"ge" => Ok(CompareOp::Ge),
					"in" => Ok(CompareOp::In),
					"out" => Ok(CompareOp::Out),
					_ => Err(self.error(&format!("unknown operator '={}='", name))),
				}
			}
			_ => Err(self.error("expected comparison operator")),
		}
	}

	fn parse_value(&mut self) -> FbResult<String> {
		self.skip_ws();
		match self.peek() {
			Some(quote @ ('\'' | '"')) => {
				self.pos += 1;
				let mut value = String::new();
				loop {
					match self.peek() {
						None => return Err(self.error("unterminated quoted value")),
						Some('\\') => {
							self.pos += 1;
							let escaped = self.peek().ok_or_else(|| self.error("dangling escape"))?;
							value.push(escaped);
							self.pos += 1;
						}
						Some(c) if c == quote => {
							self.pos += 1;
							return Ok(value);
						}
						Some(c) => {
							value.push(c);
							self.pos += 1;
						}
					}
				}
			}
			_ => {
				let start = self.pos;
				while self.peek().is_some_and(|c| {
					!c.is_whitespace() && !matches!(c, '\'' | '"' | '(' | ')' | ';' | ',' | '=' | '!')
				}) {
					self.pos += 1;
				}
				if start == self.pos {
					return Err(self.error("expected value"));
				}
				Ok(self.chars[start..self.pos].iter().collect())
			}
		}
	}
}

// Paging //
//********//
/// Validated list request
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
	pub offset: u64,
	pub limit: u32,
	pub sort: Vec<SortField>,
	pub filter: Option<Filter>,
}

impl PageRequest {
	/// Validate raw parameters against the fields of `T`.
	///
	/// `limit` is clamped to `1..=max_limit`; a missing limit means
	/// `DEFAULT_PAGE_LIMIT`.
	pub fn parse<T: Queryable>(params: &ListParams, max_limit: u32) -> FbResult<Self> {
		let max_limit = max_limit.max(1);
		let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, max_limit);
		let sort = match params.sort.as_deref() {
			Some(text) => parse_sort::<T>(text)?,
			None => Vec::new(),
		};
		let filter = match params.q.as_deref().map(str::trim) {
			Some(text) if !text.is_empty() => Some(Filter::parse::<T>(text)?),
			_ => None,
		};
		Ok(Self { offset: params.offset.unwrap_or(0), limit, sort, filter })
	}

	/// Filter, order and window `items`
	pub fn apply<T: Queryable>(&self, items: Vec<T>) -> Page<T> {
		let mut items: Vec<T> = match &self.filter {
			Some(filter) => items.into_iter().filter(|item| filter.matches(item)).collect(),
			None => items,
		};
		let total = items.len() as u64;

		items.sort_by(|a, b| {
			self.sort
				.iter()
				.map(|s| {
					let ord = compare_values(&a.field(s.field), &b.field(s.field));
					match s.direction {
						SortDirection::Asc => ord,
						SortDirection::Desc => ord.reverse(),
					}
				})
				.find(|ord| *ord != Ordering::Equal)
				.unwrap_or_else(|| a.id().cmp(&b.id()))
		});

		let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
		let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
		let items = items.into_iter().skip(offset).take(limit).collect();

		Page { items, offset: self.offset, limit: self.limit, total }
	}
}

/// One window of a listing
#[derive(Debug, Clone)]
pub struct Page<T> {
	pub items: Vec<T>,
	pub offset: u64,
	pub limit: u32,
	/// Number of matches before windowing
	pub total: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn smt(id: i64, key: &str, name: &str, max: u32) -> ModuleType {
		ModuleType {
			smt_id: id,
			key: key.into(),
			name: name.into(),
			description: None,
			colour: None,
			max_assignments: max,
			created_at: Timestamp(0),
			updated_at: Timestamp(0),
		}
	}

	fn catalog() -> Vec<ModuleType> {
		vec![
			smt(1, "os", "Firmware", 1),
			smt(2, "app", "Application", 5),
			smt(3, "runtime", "Runtime", 1),
			smt(4, "config", "config bundle", 3),
		]
	}

	fn ids(page: &Page<ModuleType>) -> Vec<i64> {
		page.items.iter().map(|t| t.smt_id).collect()
	}

	fn request(sort: Option<&str>, q: Option<&str>) -> PageRequest {
		let params = ListParams {
			sort: sort.map(String::from),
			q: q.map(String::from),
			..ListParams::default()
		};
		PageRequest::parse::<ModuleType>(&params, MAX_PAGE_LIMIT).expect("valid request")
	}

	#[test]
	fn test_limit_clamped() {
		let params = ListParams { limit: Some(10_000), ..ListParams::default() };
		let req = PageRequest::parse::<ModuleType>(&params, MAX_PAGE_LIMIT).expect("parse");
		assert_eq!(req.limit, MAX_PAGE_LIMIT);

		let params = ListParams { limit: Some(0), ..ListParams::default() };
		let req = PageRequest::parse::<ModuleType>(&params, MAX_PAGE_LIMIT).expect("parse");
		assert_eq!(req.limit, 1);

		let req = PageRequest::parse::<ModuleType>(&ListParams::default(), MAX_PAGE_LIMIT)
			.expect("parse");
		assert_eq!(req.limit, DEFAULT_PAGE_LIMIT);
	}

	#[test]
	fn test_sort_with_id_tie_break() {
		let page = request(Some("maxAssignments:asc"), None).apply(catalog());
		assert_eq!(ids(&page), vec![1, 3, 4, 2]);

		let page = request(Some("maxAssignments:DESC"), None).apply(catalog());
		assert_eq!(ids(&page), vec![2, 4, 1, 3]);

		let page = request(Some("name"), None).apply(catalog());
		assert_eq!(ids(&page), vec![2, 4, 1, 3]);
	}

	#[test]
	fn test_unknown_sort_field_rejected() {
		let params = ListParams { sort: Some("colour:asc".into()), ..ListParams::default() };
		assert!(matches!(
			PageRequest::parse::<ModuleType>(&params, MAX_PAGE_LIMIT),
			Err(Error::InvalidQuery(_))
		));
		let params = ListParams { sort: Some("name:sideways".into()), ..ListParams::default() };
		assert!(matches!(
			PageRequest::parse::<ModuleType>(&params, MAX_PAGE_LIMIT),
			Err(Error::InvalidQuery(_))
		));
	}

	#[test]
	fn test_filter_comparisons() {
		let page = request(None, Some("maxAssignments==1")).apply(catalog());
		assert_eq!(ids(&page), vec![1, 3]);
		assert_eq!(page.total, 2);

		let page = request(None, Some("maxAssignments=gt=1;name!=config*")).apply(catalog());
		assert_eq!(ids(&page), vec![2]);

		let page = request(None, Some("key=in=(os,app)")).apply(catalog());
		assert_eq!(ids(&page), vec![1, 2]);

		let page = request(None, Some("key=out=(os,app)")).apply(catalog());
		assert_eq!(ids(&page), vec![3, 4]);

		let page = request(None, Some("name=='CONFIG BUNDLE'")).apply(catalog());
		assert_eq!(ids(&page), vec![4]);
	}

	#[test]
	fn test_filter_precedence_and_grouping() {
		// AND binds tighter than OR
		let page = request(None, Some("key==os,key==app;maxAssignments==1")).apply(catalog());
		assert_eq!(ids(&page), vec![1]);

		let page = request(None, Some("(key==os,key==app);maxAssignments=ge=1")).apply(catalog());
		assert_eq!(ids(&page), vec![1, 2]);
	}

	#[test]
	fn test_filter_missing_description() {
		let page = request(None, Some("description==*")).apply(catalog());
		assert!(page.items.is_empty());
		let page = request(None, Some("description!=x")).apply(catalog());
		assert_eq!(page.total, 4);
	}

	#[test]
	fn test_malformed_filters_rejected() {
		for bad in [
			"name",
			"name==",
			"name=like=x",
			"colour==red",
			"(name==x",
			"maxAssignments==many",
			"key=in=os",
			"name=='open",
		] {
			let params = ListParams { q: Some(bad.into()), ..ListParams::default() };
			assert!(
				matches!(
					PageRequest::parse::<ModuleType>(&params, MAX_PAGE_LIMIT),
					Err(Error::InvalidQuery(_))
				),
				"{:?} should be rejected",
				bad
			);
		}
	}

	#[test]
	fn test_windows_cover_listing() {
		let mut seen = Vec::new();
		let mut offset = 0;
		loop {
			let params = ListParams { offset: Some(offset), limit: Some(3), ..ListParams::default() };
			let page = PageRequest::parse::<ModuleType>(&params, MAX_PAGE_LIMIT)
				.expect("parse")
				.apply(catalog());
			if page.items.is_empty() {
				break;
			}
			seen.extend(ids(&page));
			offset += 3;
		}
		assert_eq!(seen, vec![1, 2, 3, 4]);
	}

	#[test]
	fn test_wildcard_match() {
		assert!(wildcard_match("fw*", "fw-1"));
		assert!(wildcard_match("*-1", "fw-1"));
		assert!(wildcard_match("f*1", "fw-1"));
		assert!(wildcard_match("*", ""));
		assert!(!wildcard_match("fw*2", "fw-1"));
	}
}

// vim: ts=4
