//! Integer arithmetic for `\eval(...)`.
//!
//! A small recursive-descent evaluator over `+ - * / % ^` with
//! parenthesized groups and unary minus. Division or modulo by zero
//! evaluates to 0 rather than failing, keeping the directive a no-op-style
//! degrade like every other handler.

struct Eval<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Eval<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn number(&mut self) -> i64 {
        self.skip_spaces();
        let mut value = 0i64;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            value = value.wrapping_mul(10).wrapping_add((b - b'0') as i64);
            self.pos += 1;
        }
        value
    }

    fn factor(&mut self) -> i64 {
        self.skip_spaces();
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                let value = self.expr();
                self.skip_spaces();
                if self.peek() == Some(b')') {
                    self.pos += 1;
                }
                value
            }
            Some(b'-') => {
                self.pos += 1;
                -self.factor()
            }
            _ => self.number(),
        }
    }

    fn term(&mut self) -> i64 {
        let mut value = self.factor();
        loop {
            self.skip_spaces();
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    value = value.wrapping_mul(self.factor());
                }
                Some(b'/') => {
                    self.pos += 1;
                    let rhs = self.factor();
                    value = value.checked_div(rhs).unwrap_or(0);
                }
                Some(b'%') => {
                    self.pos += 1;
                    let rhs = self.factor();
                    value = value.checked_rem(rhs).unwrap_or(0);
                }
                Some(b'^') => {
                    self.pos += 1;
                    let rhs = self.factor();
                    value = if rhs < 0 {
                        0
                    } else {
                        value.wrapping_pow(rhs.min(u32::MAX as i64) as u32)
                    };
                }
                _ => return value,
            }
        }
    }

    fn expr(&mut self) -> i64 {
        let mut value = self.term();
        loop {
            self.skip_spaces();
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    value = value.wrapping_add(self.term());
                }
                Some(b'-') => {
                    self.pos += 1;
                    value = value.wrapping_sub(self.term());
                }
                // Anything else ends this expression; a `)` is left for
                // the enclosing `factor` to consume.
                _ => return value,
            }
        }
    }
}

/// Evaluates an integer arithmetic expression.
pub fn evaluate(input: &str) -> i64 {
    Eval { bytes: input.as_bytes(), pos: 0 }.expr()
}

#[cfg(test)]
mod tests {
    use super::evaluate;

    #[test]
    fn basic_arithmetic() {
        assert_eq!(evaluate("2+3"), 5);
        assert_eq!(evaluate("10-4"), 6);
        assert_eq!(evaluate("6*7"), 42);
        assert_eq!(evaluate("9/2"), 4);
        assert_eq!(evaluate("9%4"), 1);
        assert_eq!(evaluate("2^10"), 1024);
    }

    #[test]
    fn precedence_and_groups() {
        assert_eq!(evaluate("2+3*4"), 14);
        assert_eq!(evaluate("(2+3)*4"), 20);
        assert_eq!(evaluate("2*(3+(4-1))"), 12);
    }

    #[test]
    fn group_result_feeds_following_operator() {
        assert_eq!(evaluate("(2+3)*4"), 20);
        assert_eq!(evaluate("2*(3+(4-1))"), 12);
        assert_eq!(evaluate("(1+2)^(1+1)"), 9);
    }

    #[test]
    fn trailing_junk_ends_evaluation() {
        assert_eq!(evaluate("4+4 and then some"), 8);
    }

    #[test]
    fn unary_minus() {
        assert_eq!(evaluate("-5"), -5);
        assert_eq!(evaluate("3*-2"), -6);
        assert_eq!(evaluate("-(2+3)"), -5);
    }

    #[test]
    fn division_by_zero_is_zero() {
        assert_eq!(evaluate("5/0"), 0);
        assert_eq!(evaluate("5%0"), 0);
    }

    #[test]
    fn whitespace_tolerated() {
        assert_eq!(evaluate(" 1 + 2 * 3 "), 7);
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(evaluate(""), 0);
    }
}
