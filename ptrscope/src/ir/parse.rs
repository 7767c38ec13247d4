//! Textual IR loader.
//!
//! Parses the line-oriented textual form of a module. The grammar is small
//! and deliberately LLVM-flavored:
//!
//! ```text
//! ; comment
//! declare @malloc(i64) -> ptr i8
//! global @handler fn(i32) -> i32
//!
//! func @main() -> i32 {
//! entry:
//!   %fp = alloca fn(i32, i32) -> i32
//!   store @plus, %fp !line 6
//!   %f = load %fp
//!   %r = call %f(1, 2) !line 7
//!   ret %r
//! }
//! ```
//!
//! Symbols starting with `@` are functions or globals, `%` names locals and
//! parameters. A trailing `!line N` attaches the source line exposed through
//! [`Instruction::line`](crate::ir::Instruction::line); instructions without
//! it report line `0`. Functions may reference one another in any order;
//! locals must be defined before use. All errors are
//! [`Error::Parse`](crate::Error::Parse) with the offending input line.

use std::path::Path;

use rustc_hash::FxHashMap;

use crate::{
    ir::{BlockId, FuncId, Module, ModuleBuilder, Type, ValueId},
    Error, Result,
};

/// Reads and parses a textual IR file.
///
/// # Errors
///
/// Returns [`Error::FileError`] if the file cannot be read and
/// [`Error::Parse`] for syntax problems.
pub fn parse_file(path: &Path) -> Result<Module> {
    let source = std::fs::read_to_string(path)?;
    parse(&source)
}

/// Parses the textual IR format into a [`Module`].
///
/// # Errors
///
/// Returns [`Error::Parse`] describing the first offending line.
pub fn parse(input: &str) -> Result<Module> {
    let lines = tokenize(input)?;
    let items = split_items(&lines)?;

    let mut module = ModuleBuilder::new();
    let mut defined = Vec::new();

    // Register every symbol first so bodies can reference functions in any
    // order.
    for item in &items {
        match item {
            Item::Declare { line, tokens } => {
                let mut c = Cursor::new(tokens, *line);
                c.expect_ident("declare")?;
                let name = c.expect_at()?;
                let params = parse_param_types(&mut c)?;
                c.expect(&Tok::Arrow)?;
                let ret = parse_type(&mut c)?;
                c.expect_end()?;
                module
                    .declare(&name, params, ret)
                    .map_err(|e| builder_error(*line, &e))?;
            }
            Item::Global { line, tokens } => {
                let mut c = Cursor::new(tokens, *line);
                c.expect_ident("global")?;
                let name = c.expect_at()?;
                let ty = parse_type(&mut c)?;
                c.expect_end()?;
                module
                    .global(&name, ty)
                    .map_err(|e| builder_error(*line, &e))?;
            }
            Item::Func { line, header, body } => {
                let mut c = Cursor::new(header, *line);
                c.expect_ident("func")?;
                let name = c.expect_at()?;
                let params = parse_named_params(&mut c)?;
                c.expect(&Tok::Arrow)?;
                let ret = parse_type(&mut c)?;
                c.expect(&Tok::LBrace)?;
                c.expect_end()?;
                let refs: Vec<(&str, Type)> = params
                    .iter()
                    .map(|(n, t)| (n.as_str(), t.clone()))
                    .collect();
                let func = module
                    .define(&name, refs, ret)
                    .map_err(|e| builder_error(*line, &e))?;
                defined.push((*line, func, params, body));
            }
        }
    }

    for (line, func, params, body) in defined {
        parse_body(&mut module, func, &params, body, line)?;
    }

    module.finish().map_err(|e| Error::Parse {
        line: 0,
        message: e.to_string(),
    })
}

fn parse_body(
    module: &mut ModuleBuilder,
    func: FuncId,
    params: &[(String, Type)],
    body: &[TokenLine],
    header_line: usize,
) -> Result<()> {
    let mut f = module.body(func)?;

    let mut scope: FxHashMap<String, ValueId> = FxHashMap::default();
    for (index, (name, _)) in params.iter().enumerate() {
        scope.insert(name.clone(), f.param(index));
    }

    // First sweep: create the blocks so branches can reference labels ahead
    // of their definition.
    let mut labels: FxHashMap<String, BlockId> = FxHashMap::default();
    for tl in body {
        if let Some(label) = as_label(tl) {
            if labels.contains_key(label) {
                return Err(Error::Parse {
                    line: tl.line,
                    message: format!("duplicate block label '{label}'"),
                });
            }
            labels.insert(label.to_string(), f.block(label));
        }
    }
    match body.first() {
        Some(first) if as_label(first).is_some() => {}
        Some(first) => {
            return Err(Error::Parse {
                line: first.line,
                message: "function body must start with a block label".to_string(),
            })
        }
        None => {
            return Err(Error::Parse {
                line: header_line,
                message: "function body is empty".to_string(),
            })
        }
    }

    for tl in body {
        if let Some(label) = as_label(tl) {
            f.switch_to(labels[label]);
            continue;
        }
        parse_instruction(&mut f, &mut scope, &labels, tl)?;
    }

    f.finish()
        .map_err(|e| builder_error(body.last().map_or(0, |tl| tl.line), &e))?;
    Ok(())
}

fn parse_instruction(
    f: &mut crate::ir::FunctionBuilder<'_>,
    scope: &mut FxHashMap<String, ValueId>,
    labels: &FxHashMap<String, BlockId>,
    tl: &TokenLine,
) -> Result<()> {
    let mut c = Cursor::new(&tl.tokens, tl.line);

    // Optional `%name =` result prefix.
    let result = if matches!(c.peek(), Some(Tok::Percent(_))) && c.peek_at(1) == Some(&Tok::Eq) {
        let name = c.expect_percent()?;
        c.expect(&Tok::Eq)?;
        Some(name)
    } else {
        None
    };

    let opcode = c.expect_any_ident()?;
    f.at(parse_line_suffix(&tl.tokens, tl.line)?);

    let produces = matches!(
        opcode.as_str(),
        "alloca" | "load" | "gep" | "bitcast" | "call" | "add" | "sub" | "mul"
    );
    if result.is_some() && !produces {
        return Err(Error::Parse {
            line: tl.line,
            message: format!("'{opcode}' does not produce a result"),
        });
    }

    let emitted = match opcode.as_str() {
        "alloca" => {
            let ty = parse_type(&mut c)?;
            let name = require_result(&result, &opcode, tl.line)?;
            Some((name, f.alloca(name, ty)))
        }
        "store" => {
            let value = parse_operand(f, scope, &mut c)?;
            c.expect(&Tok::Comma)?;
            let ptr = parse_operand(f, scope, &mut c)?;
            f.store(value, ptr).map_err(|e| builder_error(tl.line, &e))?;
            None
        }
        "load" => {
            let ptr = parse_operand(f, scope, &mut c)?;
            let name = require_result(&result, &opcode, tl.line)?;
            Some((name, f.load(name, ptr)))
        }
        "gep" => {
            let base = parse_operand(f, scope, &mut c)?;
            let name = require_result(&result, &opcode, tl.line)?;
            Some((name, f.gep(name, base)))
        }
        "bitcast" => {
            let src = parse_operand(f, scope, &mut c)?;
            c.expect_ident("to")?;
            let ty = parse_type(&mut c)?;
            let name = require_result(&result, &opcode, tl.line)?;
            Some((name, f.bitcast(name, src, ty)))
        }
        "memcpy" => {
            let dst = parse_operand(f, scope, &mut c)?;
            c.expect(&Tok::Comma)?;
            let src = parse_operand(f, scope, &mut c)?;
            f.memcpy(dst, src).map_err(|e| builder_error(tl.line, &e))?;
            None
        }
        "memset" => {
            let dst = parse_operand(f, scope, &mut c)?;
            f.memset(dst).map_err(|e| builder_error(tl.line, &e))?;
            None
        }
        "call" => {
            let callee = parse_operand(f, scope, &mut c)?;
            c.expect(&Tok::LParen)?;
            let mut args = Vec::new();
            if c.peek() != Some(&Tok::RParen) {
                loop {
                    args.push(parse_operand(f, scope, &mut c)?);
                    if c.peek() == Some(&Tok::Comma) {
                        c.next();
                    } else {
                        break;
                    }
                }
            }
            c.expect(&Tok::RParen)?;
            let produced = f
                .call(result.as_deref(), callee, &args)
                .map_err(|e| builder_error(tl.line, &e))?;
            match (&result, produced) {
                (Some(name), Some(id)) => {
                    scope.insert(name.clone(), id);
                }
                (Some(name), None) => {
                    return Err(Error::Parse {
                        line: tl.line,
                        message: format!("'%{name}' bound to a call returning void"),
                    })
                }
                (None, _) => {}
            }
            None
        }
        "ret" => {
            let value = if c.at_operand() {
                Some(parse_operand(f, scope, &mut c)?)
            } else {
                None
            };
            f.ret(value).map_err(|e| builder_error(tl.line, &e))?;
            None
        }
        "br" => {
            let target = c.expect_any_ident()?;
            let block = resolve_label(labels, &target, tl.line)?;
            f.br(block).map_err(|e| builder_error(tl.line, &e))?;
            None
        }
        "condbr" => {
            let cond = parse_operand(f, scope, &mut c)?;
            c.expect(&Tok::Comma)?;
            let then_label = c.expect_any_ident()?;
            c.expect(&Tok::Comma)?;
            let else_label = c.expect_any_ident()?;
            let then_dest = resolve_label(labels, &then_label, tl.line)?;
            let else_dest = resolve_label(labels, &else_label, tl.line)?;
            f.cond_br(cond, then_dest, else_dest)
                .map_err(|e| builder_error(tl.line, &e))?;
            None
        }
        "dbg" => {
            f.dbg().map_err(|e| builder_error(tl.line, &e))?;
            None
        }
        "add" | "sub" | "mul" => {
            let lhs = parse_operand(f, scope, &mut c)?;
            c.expect(&Tok::Comma)?;
            let rhs = parse_operand(f, scope, &mut c)?;
            let name = require_result(&result, &opcode, tl.line)?;
            Some((name, f.other(name, &opcode, &[lhs, rhs], Type::Int(64))))
        }
        other => {
            return Err(Error::Parse {
                line: tl.line,
                message: format!("unknown opcode '{other}'"),
            })
        }
    };

    if let Some((name, produced)) = emitted {
        let id = produced.map_err(|e| builder_error(tl.line, &e))?;
        scope.insert(name.to_string(), id);
    }

    // Remaining tokens must be the already-consumed `!line N` suffix.
    c.skip_line_suffix();
    c.expect_end()
}

fn require_result<'a>(result: &'a Option<String>, opcode: &str, line: usize) -> Result<&'a str> {
    result.as_deref().ok_or_else(|| Error::Parse {
        line,
        message: format!("'{opcode}' requires a '%name =' result"),
    })
}

fn resolve_label(labels: &FxHashMap<String, BlockId>, name: &str, line: usize) -> Result<BlockId> {
    labels.get(name).copied().ok_or_else(|| Error::Parse {
        line,
        message: format!("unknown block label '{name}'"),
    })
}

fn parse_operand(
    f: &mut crate::ir::FunctionBuilder<'_>,
    scope: &FxHashMap<String, ValueId>,
    c: &mut Cursor<'_>,
) -> Result<ValueId> {
    match c.next() {
        Some(Tok::Percent(name)) => scope.get(name).copied().ok_or_else(|| Error::Parse {
            line: c.line,
            message: format!("use of undefined local '%{name}'"),
        }),
        Some(Tok::At(name)) => f.symbol(name).ok_or_else(|| Error::Parse {
            line: c.line,
            message: format!("unknown symbol '@{name}'"),
        }),
        Some(Tok::Int(v)) => {
            let v = *v;
            Ok(f.const_int(v))
        }
        Some(Tok::Ident(word)) if word == "null" => Ok(f.const_null(Type::ptr(Type::Int(8)))),
        other => Err(Error::Parse {
            line: c.line,
            message: format!("expected an operand, found {}", describe(other)),
        }),
    }
}

/// Extracts the `!line N` suffix value, or `0` when absent.
fn parse_line_suffix(tokens: &[Tok], line: usize) -> Result<u32> {
    let Some(pos) = tokens.iter().position(|t| *t == Tok::Bang) else {
        return Ok(0);
    };
    match (tokens.get(pos + 1), tokens.get(pos + 2), tokens.len()) {
        (Some(Tok::Ident(word)), Some(Tok::Int(v)), len)
            if word == "line" && len == pos + 3 && *v >= 0 =>
        {
            u32::try_from(*v).map_err(|_| Error::Parse {
                line,
                message: "line number out of range".to_string(),
            })
        }
        _ => Err(Error::Parse {
            line,
            message: "expected '!line N' at end of instruction".to_string(),
        }),
    }
}

fn parse_param_types(c: &mut Cursor<'_>) -> Result<Vec<Type>> {
    c.expect(&Tok::LParen)?;
    let mut params = Vec::new();
    if c.peek() != Some(&Tok::RParen) {
        loop {
            params.push(parse_type(c)?);
            if c.peek() == Some(&Tok::Comma) {
                c.next();
            } else {
                break;
            }
        }
    }
    c.expect(&Tok::RParen)?;
    Ok(params)
}

fn parse_named_params(c: &mut Cursor<'_>) -> Result<Vec<(String, Type)>> {
    c.expect(&Tok::LParen)?;
    let mut params = Vec::new();
    if c.peek() != Some(&Tok::RParen) {
        loop {
            let ty = parse_type(c)?;
            let name = c.expect_percent()?;
            params.push((name, ty));
            if c.peek() == Some(&Tok::Comma) {
                c.next();
            } else {
                break;
            }
        }
    }
    c.expect(&Tok::RParen)?;
    Ok(params)
}

/// Parses a type at the cursor: `void`, `iN`, `ptr <ty>`, `fn(..) -> <ty>`.
fn parse_type(c: &mut Cursor<'_>) -> Result<Type> {
    let word = c.expect_any_ident()?;
    match word.as_str() {
        "void" => Ok(Type::Void),
        "ptr" => Ok(Type::ptr(parse_type(c)?)),
        "fn" => {
            let params = parse_param_types(c)?;
            c.expect(&Tok::Arrow)?;
            let ret = parse_type(c)?;
            Ok(Type::func(params, ret))
        }
        w => {
            if let Some(bits) = w.strip_prefix('i').and_then(|b| b.parse::<u16>().ok()) {
                Ok(Type::Int(bits))
            } else {
                Err(Error::Parse {
                    line: c.line,
                    message: format!("expected a type, found '{w}'"),
                })
            }
        }
    }
}

fn builder_error(line: usize, e: &Error) -> Error {
    Error::Parse {
        line,
        message: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tokenizer and line structure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    Ident(String),
    Percent(String),
    At(String),
    Int(i64),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Eq,
    Arrow,
    Bang,
}

fn describe(tok: Option<&Tok>) -> String {
    match tok {
        None => "end of line".to_string(),
        Some(Tok::Ident(w)) => format!("'{w}'"),
        Some(Tok::Percent(w)) => format!("'%{w}'"),
        Some(Tok::At(w)) => format!("'@{w}'"),
        Some(Tok::Int(v)) => format!("'{v}'"),
        Some(Tok::LParen) => "'('".to_string(),
        Some(Tok::RParen) => "')'".to_string(),
        Some(Tok::LBrace) => "'{'".to_string(),
        Some(Tok::RBrace) => "'}'".to_string(),
        Some(Tok::Comma) => "','".to_string(),
        Some(Tok::Colon) => "':'".to_string(),
        Some(Tok::Eq) => "'='".to_string(),
        Some(Tok::Arrow) => "'->'".to_string(),
        Some(Tok::Bang) => "'!'".to_string(),
    }
}

#[derive(Debug)]
struct TokenLine {
    line: usize,
    tokens: Vec<Tok>,
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

fn tokenize(input: &str) -> Result<Vec<TokenLine>> {
    let mut lines = Vec::new();
    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let text = raw.split(';').next().unwrap_or("");
        let mut tokens = Vec::new();
        let mut chars = text.char_indices().peekable();
        while let Some((pos, ch)) = chars.next() {
            match ch {
                c if c.is_whitespace() => {}
                '(' => tokens.push(Tok::LParen),
                ')' => tokens.push(Tok::RParen),
                '{' => tokens.push(Tok::LBrace),
                '}' => tokens.push(Tok::RBrace),
                ',' => tokens.push(Tok::Comma),
                ':' => tokens.push(Tok::Colon),
                '=' => tokens.push(Tok::Eq),
                '!' => tokens.push(Tok::Bang),
                '-' => {
                    if chars.peek().map(|&(_, c)| c) == Some('>') {
                        chars.next();
                        tokens.push(Tok::Arrow);
                    } else if chars.peek().is_some_and(|&(_, c)| c.is_ascii_digit()) {
                        let value = take_int(&mut chars, true, line)?;
                        tokens.push(Tok::Int(value));
                    } else {
                        return Err(Error::Parse {
                            line,
                            message: "stray '-'".to_string(),
                        });
                    }
                }
                '%' | '@' => {
                    let word = take_word(text, &mut chars, pos + 1, pos + 1);
                    if word.is_empty() {
                        return Err(Error::Parse {
                            line,
                            message: format!("'{ch}' must be followed by a name"),
                        });
                    }
                    if ch == '%' {
                        tokens.push(Tok::Percent(word));
                    } else {
                        tokens.push(Tok::At(word));
                    }
                }
                c if c.is_ascii_digit() => {
                    let mut digits = String::new();
                    digits.push(c);
                    while chars.peek().is_some_and(|&(_, c)| c.is_ascii_digit()) {
                        digits.push(chars.next().unwrap().1);
                    }
                    let value = digits.parse::<i64>().map_err(|_| Error::Parse {
                        line,
                        message: format!("integer '{digits}' out of range"),
                    })?;
                    tokens.push(Tok::Int(value));
                }
                c if is_ident_char(c) => {
                    let word = take_word(text, &mut chars, pos, pos + c.len_utf8());
                    tokens.push(Tok::Ident(word));
                }
                other => {
                    return Err(Error::Parse {
                        line,
                        message: format!("unexpected character '{other}'"),
                    })
                }
            }
        }
        if !tokens.is_empty() {
            lines.push(TokenLine { line, tokens });
        }
    }
    Ok(lines)
}

fn take_word(
    text: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    start: usize,
    mut end: usize,
) -> String {
    while let Some(&(pos, c)) = chars.peek() {
        if is_ident_char(c) {
            end = pos + c.len_utf8();
            chars.next();
        } else {
            break;
        }
    }
    text[start..end].to_string()
}

fn take_int(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    negative: bool,
    line: usize,
) -> Result<i64> {
    let mut digits = String::new();
    if negative {
        digits.push('-');
    }
    while chars.peek().is_some_and(|&(_, c)| c.is_ascii_digit()) {
        digits.push(chars.next().unwrap().1);
    }
    digits.parse::<i64>().map_err(|_| Error::Parse {
        line,
        message: format!("integer '{digits}' out of range"),
    })
}

#[derive(Debug)]
enum Item<'t> {
    Declare {
        line: usize,
        tokens: &'t [Tok],
    },
    Global {
        line: usize,
        tokens: &'t [Tok],
    },
    Func {
        line: usize,
        header: &'t [Tok],
        body: &'t [TokenLine],
    },
}

fn split_items(lines: &[TokenLine]) -> Result<Vec<Item<'_>>> {
    let mut items = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let tl = &lines[i];
        match tl.tokens.first() {
            Some(Tok::Ident(word)) if word == "declare" => {
                items.push(Item::Declare {
                    line: tl.line,
                    tokens: &tl.tokens,
                });
                i += 1;
            }
            Some(Tok::Ident(word)) if word == "global" => {
                items.push(Item::Global {
                    line: tl.line,
                    tokens: &tl.tokens,
                });
                i += 1;
            }
            Some(Tok::Ident(word)) if word == "func" => {
                let start = i + 1;
                let mut end = start;
                while end < lines.len() && lines[end].tokens != [Tok::RBrace] {
                    end += 1;
                }
                if end == lines.len() {
                    return Err(Error::Parse {
                        line: tl.line,
                        message: "unterminated function body, missing '}'".to_string(),
                    });
                }
                items.push(Item::Func {
                    line: tl.line,
                    header: &tl.tokens,
                    body: &lines[start..end],
                });
                i = end + 1;
            }
            _ => {
                return Err(Error::Parse {
                    line: tl.line,
                    message: "expected 'declare', 'global', or 'func'".to_string(),
                })
            }
        }
    }
    Ok(items)
}

fn as_label(tl: &TokenLine) -> Option<&str> {
    match tl.tokens.as_slice() {
        [Tok::Ident(name), Tok::Colon] => Some(name),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Token cursor
// ---------------------------------------------------------------------------

struct Cursor<'t> {
    tokens: &'t [Tok],
    pos: usize,
    line: usize,
}

impl<'t> Cursor<'t> {
    fn new(tokens: &'t [Tok], line: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            line,
        }
    }

    fn peek(&self) -> Option<&'t Tok> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'t Tok> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<&'t Tok> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_operand(&self) -> bool {
        matches!(
            self.peek(),
            Some(Tok::Percent(_) | Tok::At(_) | Tok::Int(_))
        ) || matches!(self.peek(), Some(Tok::Ident(w)) if w == "null")
    }

    fn expect(&mut self, expected: &Tok) -> Result<()> {
        match self.next() {
            Some(tok) if tok == expected => Ok(()),
            other => Err(Error::Parse {
                line: self.line,
                message: format!(
                    "expected {}, found {}",
                    describe(Some(expected)),
                    describe(other)
                ),
            }),
        }
    }

    fn expect_ident(&mut self, word: &str) -> Result<()> {
        match self.next() {
            Some(Tok::Ident(w)) if w == word => Ok(()),
            other => Err(Error::Parse {
                line: self.line,
                message: format!("expected '{word}', found {}", describe(other)),
            }),
        }
    }

    fn expect_any_ident(&mut self) -> Result<String> {
        match self.next() {
            Some(Tok::Ident(w)) => Ok(w.clone()),
            other => Err(Error::Parse {
                line: self.line,
                message: format!("expected an identifier, found {}", describe(other)),
            }),
        }
    }

    fn expect_percent(&mut self) -> Result<String> {
        match self.next() {
            Some(Tok::Percent(w)) => Ok(w.clone()),
            other => Err(Error::Parse {
                line: self.line,
                message: format!("expected a '%name', found {}", describe(other)),
            }),
        }
    }

    fn expect_at(&mut self) -> Result<String> {
        match self.next() {
            Some(Tok::At(w)) => Ok(w.clone()),
            other => Err(Error::Parse {
                line: self.line,
                message: format!("expected an '@name', found {}", describe(other)),
            }),
        }
    }

    /// Consumes a trailing `!line N` suffix if present; the value itself is
    /// read separately before emission.
    fn skip_line_suffix(&mut self) {
        if self.peek() == Some(&Tok::Bang) {
            self.pos = self.tokens.len();
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            other => Err(Error::Parse {
                line: self.line,
                message: format!("trailing input: {}", describe(other)),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::InstKind;

    #[test]
    fn parse_minimal_function() {
        let module = parse(
            "func @answer() -> i32 {\n\
             entry:\n\
             \x20 ret 42\n\
             }\n",
        )
        .unwrap();
        assert_eq!(module.functions().len(), 1);
        let f = &module.functions()[0];
        assert_eq!(f.name(), "answer");
        assert_eq!(f.blocks().len(), 1);
    }

    #[test]
    fn parse_declaration_and_call() {
        let module = parse(
            "declare @malloc(i64) -> ptr i8\n\
             func @main() -> i32 {\n\
             entry:\n\
             \x20 %p = call @malloc(8) !line 30\n\
             \x20 ret 0\n\
             }\n",
        )
        .unwrap();
        let main = module.function(module.function_by_name("main").unwrap());
        let call = &main.blocks()[0].instructions()[0];
        assert_eq!(call.line(), 30);
        assert!(matches!(call.kind(), InstKind::Call { .. }));
    }

    #[test]
    fn parse_branches_and_labels() {
        let module = parse(
            "func @pick(i32 %k) -> i32 {\n\
             entry:\n\
             \x20 condbr %k, then, else\n\
             then:\n\
             \x20 ret 1\n\
             else:\n\
             \x20 ret 2\n\
             }\n",
        )
        .unwrap();
        let f = &module.functions()[0];
        assert_eq!(f.blocks().len(), 3);
        assert_eq!(f.exits().len(), 2);
    }

    #[test]
    fn forward_function_references() {
        let module = parse(
            "func @main() -> i32 {\n\
             entry:\n\
             \x20 %fp = alloca fn(i32, i32) -> i32\n\
             \x20 store @plus, %fp\n\
             \x20 ret 0\n\
             }\n\
             func @plus(i32 %a, i32 %b) -> i32 {\n\
             entry:\n\
             \x20 %s = add %a, %b\n\
             \x20 ret %s\n\
             }\n",
        )
        .unwrap();
        assert_eq!(module.functions().len(), 2);
    }

    #[test]
    fn undefined_local_is_reported() {
        let err = parse(
            "func @main() -> i32 {\n\
             entry:\n\
             \x20 ret %missing\n\
             }\n",
        )
        .unwrap_err();
        match err {
            Error::Parse { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("%missing"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_opcode_is_reported() {
        let err = parse(
            "func @main() -> void {\n\
             entry:\n\
             \x20 frobnicate 1, 2\n\
             \x20 ret\n\
             }\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }

    #[test]
    fn missing_brace_is_reported() {
        let err = parse("func @main() -> i32 {\nentry:\n  ret 0\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn function_types_nest() {
        let module = parse(
            "global @slot fn(i32) -> i32\n\
             func @main() -> void {\n\
             entry:\n\
             \x20 %h = load @slot\n\
             \x20 call %h(1)\n\
             \x20 ret\n\
             }\n",
        )
        .unwrap();
        assert_eq!(module.globals().len(), 1);
    }
}
