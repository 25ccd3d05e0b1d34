//! Parser for the netlist format.

use super::ast::*;
use super::lexer::{parse_value, Lexer, Token, TokenKind};
use crate::error::{HilError, Result};

/// Parser for netlists.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser with the given lexer.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse the entire netlist.
    pub fn parse(&mut self) -> Result<NetlistAst> {
        let mut ast = NetlistAst::new();

        while self.current.kind != TokenKind::Eof {
            match self.current.kind {
                TokenKind::Newline => {
                    self.advance()?;
                    continue;
                }
                TokenKind::Directive => {
                    if self.current.text.eq_ignore_ascii_case(".end") {
                        break;
                    }
                    self.parse_directive(&mut ast)?;
                }
                TokenKind::Identifier => {
                    let element = self.parse_element()?;
                    ast.statements.push(Statement::Element(element));
                }
                _ => {
                    return Err(HilError::parse(
                        self.current.line,
                        format!("unexpected token: {:?}", self.current.text),
                    ));
                }
            }

            self.end_of_line()?;
        }

        Ok(ast)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current.kind == kind {
            let tok = self.current.clone();
            self.advance()?;
            Ok(tok)
        } else {
            Err(HilError::parse(
                self.current.line,
                format!("expected {:?}, got {:?}", kind, self.current.text),
            ))
        }
    }

    fn at_line_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Newline | TokenKind::Eof)
    }

    fn end_of_line(&mut self) -> Result<()> {
        match self.current.kind {
            TokenKind::Newline => self.advance(),
            TokenKind::Eof => Ok(()),
            _ => Err(HilError::parse(
                self.current.line,
                format!("unexpected trailing token: {:?}", self.current.text),
            )),
        }
    }

    fn number(&mut self) -> Result<f64> {
        let tok = self.expect(TokenKind::Number)?;
        parse_value(&tok.text).ok_or_else(|| HilError::parse(tok.line, format!("invalid number: {}", tok.text)))
    }

    /// A node reference: a non-negative integer, or `GND`.
    fn node(&mut self) -> Result<usize> {
        let tok = self.current.clone();
        let node = match tok.kind {
            TokenKind::Number => tok.text.parse::<usize>().ok(),
            TokenKind::Identifier if tok.text.eq_ignore_ascii_case("gnd") => Some(0),
            _ => None,
        };
        let node = node.ok_or_else(|| HilError::parse(tok.line, format!("expected node index, got {:?}", tok.text)))?;
        self.advance()?;
        Ok(node)
    }

    fn parse_directive(&mut self, ast: &mut NetlistAst) -> Result<()> {
        let directive = self.current.text.to_ascii_lowercase();
        let line = self.current.line;
        self.advance()?;

        match directive.as_str() {
            ".circuit" => {
                if ast.header.is_some() {
                    return Err(HilError::parse(line, "duplicate .circuit directive"));
                }
                let nodes = self.node()?;
                let dt = self.number()?;
                ast.header = Some(CircuitHeader { nodes, dt, line });
            }
            ".solver" => {
                let name = self.expect(TokenKind::Identifier)?.text;
                ast.solver = Some(name.parse().map_err(|e: String| HilError::parse(line, e))?);
            }
            ".assembly" => {
                let name = self.expect(TokenKind::Identifier)?.text;
                ast.assembly = Some(name.parse().map_err(|e: String| HilError::parse(line, e))?);
            }
            ".rl" => {
                let name = self.expect(TokenKind::Identifier)?.text;
                let nodes = [self.node()?, self.node()?];
                let resistance = self.number()?;
                let inductance = self.number()?;
                ast.statements.push(Statement::SeriesRl(SeriesRlDef {
                    name,
                    nodes,
                    resistance,
                    inductance,
                    line,
                }));
            }
            ".probe" => {
                let probe = self.parse_probe(line)?;
                ast.statements.push(Statement::Probe(probe));
            }
            _ => {
                return Err(HilError::parse(line, format!("unknown directive: {}", directive)));
            }
        }

        Ok(())
    }

    fn parse_probe(&mut self, line: usize) -> Result<ProbeDef> {
        let kind = self.expect(TokenKind::Identifier)?.text;
        self.expect(TokenKind::OpenParen)?;
        let target = match kind.to_ascii_lowercase().as_str() {
            "v" => ProbeRef::Voltage(self.node()?),
            "i" => ProbeRef::Current(self.expect(TokenKind::Identifier)?.text),
            _ => return Err(HilError::parse(line, format!("unknown probe kind: {}", kind))),
        };
        self.expect(TokenKind::CloseParen)?;

        let (gain, offset) = if self.at_line_end() {
            (1.0, 0.0)
        } else {
            (self.number()?, self.number()?)
        };

        Ok(ProbeDef {
            target,
            gain,
            offset,
            line,
        })
    }

    fn parse_element(&mut self) -> Result<ElementDef> {
        let name = self.current.text.clone();
        let line = self.current.line;
        self.advance()?;

        let first_char = name.chars().next().unwrap_or('?');
        let element_type = ElementType::from_prefix(first_char).ok_or_else(|| HilError::UnknownComponentType {
            component_type: name.clone(),
            line,
        })?;

        let mut nodes = Vec::with_capacity(element_type.expected_node_count());
        for _ in 0..element_type.expected_node_count() {
            if self.at_line_end() {
                return Err(HilError::invalid_component(
                    &name,
                    line,
                    format!(
                        "expected {} nodes, got {}",
                        element_type.expected_node_count(),
                        nodes.len()
                    ),
                ));
            }
            nodes.push(self.node()?);
        }

        let controller = if element_type.has_controller() {
            Some(self.expect(TokenKind::Identifier)?.text)
        } else {
            None
        };

        let source = if element_type.is_source() {
            Some(self.parse_source_spec(&name, line)?)
        } else {
            None
        };

        let mut values = Vec::with_capacity(element_type.expected_value_count());
        for _ in 0..element_type.expected_value_count() {
            if self.at_line_end() {
                return Err(HilError::invalid_component(
                    &name,
                    line,
                    format!(
                        "expected {} values, got {}",
                        element_type.expected_value_count(),
                        values.len()
                    ),
                ));
            }
            values.push(self.number()?);
        }

        Ok(ElementDef {
            element_type,
            name,
            nodes,
            controller,
            values,
            source,
            line,
        })
    }

    /// `[DC] v | SIN(...) | PULSE(...) | EXT(...)`
    fn parse_source_spec(&mut self, name: &str, line: usize) -> Result<SourceSpec> {
        if self.current.kind == TokenKind::Number {
            return Ok(SourceSpec::Dc(self.number()?));
        }

        let keyword = self.expect(TokenKind::Identifier)?.text.to_ascii_uppercase();
        if keyword == "DC" {
            return Ok(SourceSpec::Dc(self.number()?));
        }

        let args = self.parse_args()?;
        let arity_error = |expected: usize| {
            HilError::invalid_component(
                name,
                line,
                format!("{} takes {} arguments, got {}", keyword, expected, args.len()),
            )
        };

        match keyword.as_str() {
            "SIN" => match args[..] {
                [offset, amplitude, frequency] => Ok(SourceSpec::Sin {
                    offset,
                    amplitude,
                    frequency,
                    phase_deg: 0.0,
                }),
                [offset, amplitude, frequency, phase_deg] => Ok(SourceSpec::Sin {
                    offset,
                    amplitude,
                    frequency,
                    phase_deg,
                }),
                _ => Err(arity_error(4)),
            },
            "PULSE" => match args[..] {
                [v1, v2, delay, rise, width, fall, period] => Ok(SourceSpec::Pulse {
                    v1,
                    v2,
                    delay,
                    rise,
                    width,
                    fall,
                    period,
                }),
                _ => Err(arity_error(7)),
            },
            "EXT" => match args[..] {
                [channel, gain, offset] if channel >= 0.0 && channel.fract() == 0.0 => Ok(SourceSpec::Ext {
                    channel: channel as usize,
                    gain,
                    offset,
                }),
                [_, _, _] => Err(HilError::invalid_component(
                    name,
                    line,
                    "EXT channel must be a non-negative integer",
                )),
                _ => Err(arity_error(3)),
            },
            _ => Err(HilError::invalid_component(
                name,
                line,
                format!("unknown source type: {}", keyword),
            )),
        }
    }

    /// Parenthesized list of numbers.
    fn parse_args(&mut self) -> Result<Vec<f64>> {
        self.expect(TokenKind::OpenParen)?;
        let mut args = Vec::new();
        while self.current.kind == TokenKind::Number {
            args.push(self.number()?);
        }
        self.expect(TokenKind::CloseParen)?;
        Ok(args)
    }
}
