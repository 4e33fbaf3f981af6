//! Reader for the CPLEX LP subset emitted by the model compiler.
//!
//! Supported: one objective section (`Minimize`/`Maximize`, optionally
//! named), `Subject To` with named or unnamed rows that may span several
//! lines, `Bounds` (`l <= x <= u`, one-sided forms, `x = v`, `x free`,
//! `±inf`), `Generals`/`Integers`, `Binaries` and `End`. A backslash starts a
//! comment that runs to the end of the line.
//!
//! Variables appear in the region in order of first mention. Unless bounded
//! otherwise, a variable lives in `[0, +inf)`.
//!
//! # Example
//!
//! ```
//! use regionfit_model::lp_format;
//!
//! let problem = lp_format::parse(
//!     "Maximize\n obj: x + 2 y\nSubject To\n c1: x + y <= 4\nBounds\n y <= 3\nGenerals\n x y\nEnd\n",
//! )
//! .unwrap();
//! assert_eq!(problem.region.dimension(), 2);
//! assert_eq!(problem.objective.coefficients(), &[1.0, 2.0]);
//! assert!(problem.region.variable(1).is_integer());
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use regionfit_core::{DomainKind, LinearConstraint, Objective, Region, Relation, Sense, Variable};
use thiserror::Error;

/// A parse failure with the 1-based line it occurred on.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("LP format error at line {line}: {message}")]
pub struct LpFormatError {
    pub line: usize,
    pub message: String,
}

impl LpFormatError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

type Result<T> = std::result::Result<T, LpFormatError>;

/// Region and objective read from an LP file.
#[derive(Debug, Clone, PartialEq)]
pub struct LpProblem {
    pub region: Region,
    pub objective: Objective,
}

/// Parses LP text into a region and its objective.
pub fn parse(text: &str) -> Result<LpProblem> {
    let mut reader = Reader::default();
    let mut section = Section::Preamble;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let content = raw.split('\\').next().unwrap_or_default();
        let words: Vec<&str> = content.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        if section == Section::End {
            return Err(LpFormatError::new(line_no, "content after End"));
        }

        let (body, next) = match Section::header(&words) {
            Some((next, consumed)) => (words[consumed..].join(" "), Some(next)),
            None => (content.to_string(), None),
        };
        if let Some(next) = next {
            if let Section::Objective(sense) = next {
                if reader.sense.is_some() {
                    return Err(LpFormatError::new(line_no, "second objective section"));
                }
                reader.sense = Some(sense);
            }
            section = next;
        }
        if body.trim().is_empty() {
            continue;
        }

        match section {
            Section::Preamble => {
                return Err(LpFormatError::new(
                    line_no,
                    "expected an objective section header",
                ))
            }
            Section::Objective(_) => lex(&body, line_no, &mut reader.objective_tokens)?,
            Section::Constraints => lex(&body, line_no, &mut reader.constraint_tokens)?,
            Section::Bounds => {
                let mut tokens = Vec::new();
                lex(&body, line_no, &mut tokens)?;
                reader.bound_line(&tokens, line_no)?;
            }
            Section::Generals => {
                for name in body.split_whitespace() {
                    reader.mark_integer(name);
                }
            }
            Section::Binaries => {
                for name in body.split_whitespace() {
                    reader.mark_integer(name);
                    reader.lower.insert(name.to_string(), (0.0, line_no));
                    reader.upper.insert(name.to_string(), (1.0, line_no));
                }
            }
            Section::End => {}
        }
    }

    if reader.sense.is_none() {
        return Err(LpFormatError::new(1, "missing objective section"));
    }
    reader.finish()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Objective(Sense),
    Constraints,
    Bounds,
    Generals,
    Binaries,
    End,
}

impl Section {
    /// Recognizes a section keyword at the start of a line and returns the
    /// number of words it spans.
    fn header(words: &[&str]) -> Option<(Section, usize)> {
        let first = words[0].to_ascii_lowercase();
        if let Some(second) = words.get(1) {
            let pair = format!("{first} {}", second.to_ascii_lowercase());
            if pair == "subject to" || pair == "such that" {
                return Some((Section::Constraints, 2));
            }
        }
        let section = match first.as_str() {
            "minimize" | "minimise" | "minimum" | "min" => Section::Objective(Sense::Minimize),
            "maximize" | "maximise" | "maximum" | "max" => Section::Objective(Sense::Maximize),
            "st" | "s.t." | "st." => Section::Constraints,
            "bounds" | "bound" => Section::Bounds,
            "general" | "generals" | "gen" | "integer" | "integers" => Section::Generals,
            "binary" | "binaries" | "bin" => Section::Binaries,
            "end" => Section::End,
            _ => return None,
        };
        Some((section, 1))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Name(String),
    Plus,
    Minus,
    Colon,
    Rel(Relation),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(v) => write!(f, "{v}"),
            Token::Name(n) => write!(f, "{n}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Colon => write!(f, ":"),
            Token::Rel(r) => write!(f, "{r}"),
        }
    }
}

#[derive(Debug, Clone)]
struct Lexed {
    token: Token,
    line: usize,
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '+' | '-' | ':' | '<' | '>' | '=')
}

fn lex(text: &str, line: usize, out: &mut Vec<Lexed>) -> Result<()> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let token = match c {
            _ if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '+' => {
                i += 1;
                Token::Plus
            }
            '-' => {
                i += 1;
                Token::Minus
            }
            ':' => {
                i += 1;
                Token::Colon
            }
            '<' | '>' | '=' => {
                let next = chars.get(i + 1).copied();
                let (relation, width) = match (c, next) {
                    ('<', Some('=')) | ('=', Some('<')) => (Relation::LessEq, 2),
                    ('>', Some('=')) | ('=', Some('>')) => (Relation::GreaterEq, 2),
                    ('<', _) => (Relation::LessEq, 1),
                    ('>', _) => (Relation::GreaterEq, 1),
                    _ => (Relation::Equal, 1),
                };
                i += width;
                Token::Rel(relation)
            }
            _ if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                if i < chars.len() && matches!(chars[i], 'e' | 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && matches!(chars[j], '+' | '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse()
                    .map_err(|_| LpFormatError::new(line, format!("invalid number '{literal}'")))?;
                Token::Number(value)
            }
            _ => {
                let start = i;
                while i < chars.len() && !is_delimiter(chars[i]) {
                    i += 1;
                }
                Token::Name(chars[start..i].iter().collect())
            }
        };
        out.push(Lexed { token, line });
    }
    Ok(())
}

fn infinity(name: &str) -> Option<f64> {
    match name.to_ascii_lowercase().as_str() {
        "inf" | "infinity" => Some(f64::INFINITY),
        _ => None,
    }
}

#[derive(Default)]
struct Reader {
    sense: Option<Sense>,
    objective_tokens: Vec<Lexed>,
    constraint_tokens: Vec<Lexed>,
    order: Vec<String>,
    known: HashSet<String>,
    lower: HashMap<String, (f64, usize)>,
    upper: HashMap<String, (f64, usize)>,
    integer: HashSet<String>,
}

impl Reader {
    fn mention(&mut self, name: &str) {
        if self.known.insert(name.to_string()) {
            self.order.push(name.to_string());
        }
    }

    fn mark_integer(&mut self, name: &str) {
        self.mention(name);
        self.integer.insert(name.to_string());
    }

    fn bound_line(&mut self, tokens: &[Lexed], line: usize) -> Result<()> {
        let mut cursor = Cursor::new(tokens, line);

        // x free
        if let [Lexed { token: Token::Name(name), .. }, Lexed { token: Token::Name(kw), .. }] = tokens
        {
            if kw.eq_ignore_ascii_case("free") {
                self.mention(name);
                self.lower.insert(name.clone(), (f64::NEG_INFINITY, line));
                self.upper.insert(name.clone(), (f64::INFINITY, line));
                return Ok(());
            }
        }

        if cursor.starts_with_value() {
            // l <= x [<= u]
            let value = cursor.value()?;
            let relation = cursor.relation()?;
            let name = cursor.name()?;
            self.mention(&name);
            self.apply_bound(&name, mirrored(relation), value, line);
            if !cursor.done() {
                let relation = cursor.relation()?;
                let value = cursor.value()?;
                self.apply_bound(&name, relation, value, line);
            }
        } else {
            // x <= u
            let name = cursor.name()?;
            self.mention(&name);
            let relation = cursor.relation()?;
            let value = cursor.value()?;
            self.apply_bound(&name, relation, value, line);
        }
        cursor.expect_done()
    }

    /// Applies `name relation value`.
    fn apply_bound(&mut self, name: &str, relation: Relation, value: f64, line: usize) {
        match relation {
            Relation::LessEq => {
                self.upper.insert(name.to_string(), (value, line));
            }
            Relation::GreaterEq => {
                self.lower.insert(name.to_string(), (value, line));
            }
            Relation::Equal => {
                self.lower.insert(name.to_string(), (value, line));
                self.upper.insert(name.to_string(), (value, line));
            }
        }
    }

    fn finish(mut self) -> Result<LpProblem> {
        // Rows and the objective come first in mention order, then names
        // seen only in Bounds/Generals/Binaries.
        let late = std::mem::take(&mut self.order);
        self.known.clear();

        let objective_tokens = std::mem::take(&mut self.objective_tokens);
        let mut cursor = Cursor::new(&objective_tokens, 1);
        cursor.skip_label();
        let (objective_terms, _offset) = cursor.expression()?;
        cursor.expect_done()?;
        for (name, _) in &objective_terms {
            self.mention(name);
        }

        let constraint_tokens = std::mem::take(&mut self.constraint_tokens);
        let mut rows = Vec::new();
        let mut cursor = Cursor::new(&constraint_tokens, 1);
        while !cursor.done() {
            let line = cursor.line();
            let label = cursor.skip_label();
            let (terms, constant) = cursor.expression()?;
            if terms.is_empty() {
                return Err(LpFormatError::new(line, "constraint without variables"));
            }
            let relation = cursor.relation()?;
            let rhs = cursor.value()?;
            for (name, _) in &terms {
                self.mention(name);
            }
            rows.push((label, terms, relation, rhs - constant, line));
        }
        for name in &late {
            self.mention(name);
        }

        let mut region = Region::new();
        for name in &self.order {
            let (lower, lower_line) = self.lower.get(name).copied().unwrap_or((0.0, 0));
            let (upper, upper_line) = self.upper.get(name).copied().unwrap_or((f64::INFINITY, 0));
            let kind = if self.integer.contains(name) {
                DomainKind::Integer
            } else {
                DomainKind::Real
            };
            let line = lower_line.max(upper_line).max(1);
            let variable = Variable::new(name.clone(), kind, lower, upper)
                .map_err(|err| LpFormatError::new(line, err.to_string()))?;
            region
                .add_variable(variable)
                .map_err(|err| LpFormatError::new(line, err.to_string()))?;
        }

        for (label, terms, relation, rhs, line) in rows {
            let mut merged: Vec<(usize, f64)> = Vec::with_capacity(terms.len());
            for (name, coef) in terms {
                let idx = region
                    .require_index(&name)
                    .map_err(|err| LpFormatError::new(line, err.to_string()))?;
                match merged.iter_mut().find(|(j, _)| *j == idx) {
                    Some((_, c)) => *c += coef,
                    None => merged.push((idx, coef)),
                }
            }
            let constraint = match label {
                Some(label) => LinearConstraint::named(label, merged, relation, rhs),
                None => LinearConstraint::new(merged, relation, rhs),
            };
            region
                .add_constraint(constraint)
                .map_err(|err| LpFormatError::new(line, err.to_string()))?;
        }

        let mut coefficients = vec![0.0; region.dimension()];
        for (name, coef) in objective_terms {
            if let Some(idx) = region.index_of(&name) {
                coefficients[idx] += coef;
            }
        }
        let sense = self.sense.unwrap_or_default();
        Ok(LpProblem {
            region,
            objective: Objective::new(coefficients, sense),
        })
    }
}

/// `v <= x` reads as `x >= v`.
fn mirrored(relation: Relation) -> Relation {
    match relation {
        Relation::LessEq => Relation::GreaterEq,
        Relation::GreaterEq => Relation::LessEq,
        Relation::Equal => Relation::Equal,
    }
}

struct Cursor<'a> {
    tokens: &'a [Lexed],
    pos: usize,
    last_line: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Lexed], first_line: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            last_line: tokens.first().map_or(first_line, |t| t.line),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|t| &t.token)
    }

    fn next(&mut self) -> Option<&Token> {
        let lexed = self.tokens.get(self.pos)?;
        self.pos += 1;
        self.last_line = lexed.line;
        Some(&lexed.token)
    }

    fn line(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.last_line, |t| t.line)
    }

    fn done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn error(&self, message: impl Into<String>) -> LpFormatError {
        LpFormatError::new(self.line(), message)
    }

    fn expect_done(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.error(format!("unexpected '{token}'"))),
        }
    }

    /// Consumes `name :` if present.
    fn skip_label(&mut self) -> Option<String> {
        match (self.peek(), self.peek_at(1)) {
            (Some(Token::Name(name)), Some(Token::Colon)) => {
                let name = name.clone();
                self.pos += 2;
                Some(name)
            }
            _ => None,
        }
    }

    fn starts_with_value(&self) -> bool {
        let mut offset = 0;
        while matches!(self.peek_at(offset), Some(Token::Plus | Token::Minus)) {
            offset += 1;
        }
        match self.peek_at(offset) {
            Some(Token::Number(_)) => true,
            Some(Token::Name(name)) => infinity(name).is_some(),
            _ => false,
        }
    }

    /// `[+|-]* (number | inf)`.
    fn value(&mut self) -> Result<f64> {
        let mut sign = 1.0;
        loop {
            match self.peek() {
                Some(Token::Plus) => {}
                Some(Token::Minus) => sign = -sign,
                _ => break,
            }
            self.pos += 1;
        }
        match self.next().cloned() {
            Some(Token::Number(v)) => Ok(sign * v),
            Some(Token::Name(name)) => infinity(&name)
                .map(|v| sign * v)
                .ok_or_else(|| self.error(format!("expected a number, found '{name}'"))),
            Some(other) => Err(self.error(format!("expected a number, found '{other}'"))),
            None => Err(self.error("expected a number")),
        }
    }

    fn relation(&mut self) -> Result<Relation> {
        match self.next().cloned() {
            Some(Token::Rel(relation)) => Ok(relation),
            Some(other) => Err(self.error(format!("expected a relation, found '{other}'"))),
            None => Err(self.error("expected a relation")),
        }
    }

    fn name(&mut self) -> Result<String> {
        match self.next().cloned() {
            Some(Token::Name(name)) if infinity(&name).is_none() => Ok(name),
            Some(other) => Err(self.error(format!("expected a variable, found '{other}'"))),
            None => Err(self.error("expected a variable")),
        }
    }

    /// Linear terms up to the next relation, a label or the end. Returns the
    /// terms and the sum of constant terms.
    fn expression(&mut self) -> Result<(Vec<(String, f64)>, f64)> {
        let mut terms = Vec::new();
        let mut constant = 0.0;
        loop {
            let mut sign = 1.0;
            let mut signed = false;
            while let Some(token @ (Token::Plus | Token::Minus)) = self.peek() {
                if *token == Token::Minus {
                    sign = -sign;
                }
                signed = true;
                self.pos += 1;
            }
            match self.peek().cloned() {
                Some(Token::Number(coef)) => {
                    self.next();
                    match self.peek().cloned() {
                        Some(Token::Name(name))
                            if infinity(&name).is_none()
                                && self.peek_at(1) != Some(&Token::Colon) =>
                        {
                            self.next();
                            terms.push((name, sign * coef));
                        }
                        _ => constant += sign * coef,
                    }
                }
                Some(Token::Name(name)) if self.peek_at(1) != Some(&Token::Colon) => {
                    self.next();
                    terms.push((name, sign));
                }
                _ => {
                    if signed {
                        return Err(self.error("dangling sign"));
                    }
                    return Ok((terms, constant));
                }
            }
        }
    }
}
