//! Regex-driven string generation.
//!
//! The directive pattern is compiled once per node into a `regex-syntax`
//! HIR, which is then walked with the generator's RNG: classes pick a
//! uniform member, alternations a uniform branch, repetitions a count
//! within their declared bounds and the remaining length budget. A sample
//! that misses the requested length window is re-drawn a bounded number of
//! times; strings are never truncated, so every produced string matches
//! the pattern.

use crate::directives::REGEX_PROP;
use crate::error::{GeneratorError, Result};
use rand::Rng;
use regex_syntax::hir::{Class, Hir, HirKind, Look};
use regex_syntax::ParserBuilder;

const MAX_DRAWS: usize = 100;

/// Extra repetitions drawn for `*`/`+` style unbounded repeats.
const UNBOUNDED_REPEAT_EXTRA: usize = 8;

/// A compiled regex ready to produce random matching strings.
pub(crate) struct RegexStringSource {
    hir: Hir,
}

impl RegexStringSource {
    pub(crate) fn compile(pattern: &str) -> Result<Self> {
        // Compile with the matching engine first so diagnostics come from
        // the same grammar the pattern will be validated against.
        regex::Regex::new(pattern).map_err(|error| GeneratorError::Shape {
            directive: REGEX_PROP,
            reason: format!("must be a valid regex: {error}"),
        })?;
        let hir = ParserBuilder::new()
            .build()
            .parse(pattern)
            .map_err(|error| GeneratorError::Shape {
                directive: REGEX_PROP,
                reason: format!("must be a valid regex: {error}"),
            })?;
        check_supported(&hir)?;
        Ok(RegexStringSource { hir })
    }

    /// Produce a matching string whose length (in chars) lies in
    /// `[min_len, max_len]`, both inclusive.
    pub(crate) fn random<R: Rng>(
        &self,
        rng: &mut R,
        min_len: usize,
        max_len: usize,
    ) -> Result<String> {
        for _ in 0..MAX_DRAWS {
            let mut sampler = Sampler {
                rng,
                out: String::new(),
                len: 0,
                limit: max_len,
            };
            sampler.walk(&self.hir);
            if (min_len..=max_len).contains(&sampler.len) {
                return Ok(sampler.out);
            }
        }
        Err(GeneratorError::Bounds {
            directive: REGEX_PROP,
            reason: format!(
                "could not produce a matching string with length in [{min_len}, {max_len}]"
            ),
        })
    }
}

fn check_supported(hir: &Hir) -> Result<()> {
    match hir.kind() {
        HirKind::Look(
            Look::WordAscii | Look::WordAsciiNegate | Look::WordUnicode | Look::WordUnicodeNegate,
        ) => Err(GeneratorError::Shape {
            directive: REGEX_PROP,
            reason: "uses word boundary escapes, which are unsupported for string generation"
                .to_string(),
        }),
        HirKind::Repetition(repetition) => check_supported(&repetition.sub),
        HirKind::Capture(capture) => check_supported(&capture.sub),
        HirKind::Concat(subs) | HirKind::Alternation(subs) => {
            subs.iter().try_for_each(check_supported)
        }
        _ => Ok(()),
    }
}

struct Sampler<'r, R> {
    rng: &'r mut R,
    out: String,
    len: usize,
    limit: usize,
}

impl<R: Rng> Sampler<'_, R> {
    fn walk(&mut self, hir: &Hir) {
        match hir.kind() {
            HirKind::Empty | HirKind::Look(_) => {}
            HirKind::Literal(literal) => {
                let text = std::str::from_utf8(&literal.0).unwrap_or_default();
                self.len += text.chars().count();
                self.out.push_str(text);
            }
            HirKind::Class(Class::Unicode(class)) => {
                let total: u64 = class
                    .ranges()
                    .iter()
                    .map(|range| u64::from(range.end() as u32 - range.start() as u32) + 1)
                    .sum();
                if total == 0 {
                    return;
                }
                let mut index = self.rng.random_range(0..total);
                for range in class.ranges() {
                    let size = u64::from(range.end() as u32 - range.start() as u32) + 1;
                    if index < size {
                        if let Some(choice) = char::from_u32(range.start() as u32 + index as u32) {
                            self.out.push(choice);
                            self.len += 1;
                        }
                        return;
                    }
                    index -= size;
                }
            }
            HirKind::Class(Class::Bytes(class)) => {
                let total: u64 = class
                    .ranges()
                    .iter()
                    .map(|range| u64::from(range.end() - range.start()) + 1)
                    .sum();
                if total == 0 {
                    return;
                }
                let mut index = self.rng.random_range(0..total);
                for range in class.ranges() {
                    let size = u64::from(range.end() - range.start()) + 1;
                    if index < size {
                        self.out.push((range.start() + index as u8) as char);
                        self.len += 1;
                        return;
                    }
                    index -= size;
                }
            }
            HirKind::Repetition(repetition) => {
                let low = repetition.min as usize;
                let declared = repetition
                    .max
                    .map(|max| max as usize)
                    .unwrap_or(low + UNBOUNDED_REPEAT_EXTRA);
                // Spend at most the remaining length budget on optional
                // repeats; the final window check still has the last word.
                let remaining = self.limit.saturating_sub(self.len);
                let high = declared.min(low + remaining).max(low);
                let count = self.rng.random_range(low..=high);
                for _ in 0..count {
                    self.walk(&repetition.sub);
                }
            }
            HirKind::Capture(capture) => self.walk(&capture.sub),
            HirKind::Concat(subs) => {
                for sub in subs {
                    self.walk(sub);
                }
            }
            HirKind::Alternation(subs) => {
                let index = self.rng.random_range(0..subs.len());
                self.walk(&subs[index]);
            }
        }
    }
}
