//! Markdown structural extractor
//!
//! Splits a pipeline document into the head section and one section per
//! template heading, separating command lines, code blocks and prose.
//!
//! ```markdown
//! # Title                     <- pipeline title
//!
//! Prose                       <- pipeline description
//!
//! - INPUT PARAMETER {thing}   <- head command
//!
//! ## Template title           <- new template section
//!
//! - EXPECT MIN 2 LINES        <- template command
//!
//! ```text
//! I bought {thing}.           <- template body
//! ```
//!
//! -> {response}               <- resulting parameter
//! ```

use crate::error::{ParseError, Result};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};

/// One list item that is a command candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub text: String,
    /// 1-based line of the list item in the source
    pub line: usize,
}

/// One fenced or indented code block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// First word of the fence info string
    pub language: Option<String>,
    pub content: String,
    pub line: usize,
}

/// The head or one template section of a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedSection {
    /// Heading text; empty for the head
    pub title: String,
    /// 1-based line of the heading
    pub line: usize,
    /// Prose paragraphs joined by blank lines
    pub description: Option<String>,
    pub command_lines: Vec<CommandLine>,
    pub code_blocks: Vec<CodeBlock>,
    /// Raw text after `->`, e.g. `{response}`
    pub result_parameter: Option<String>,
}

/// A document split into sections, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPipeline {
    /// Text of the first level-1 heading
    pub title: Option<String>,
    pub head: ExtractedSection,
    pub templates: Vec<ExtractedSection>,
}

/// Extract the structure of a pipeline document
pub fn extract_pipeline(markdown: &str) -> Result<ExtractedPipeline> {
    Extractor::new(markdown).run()
}

/// Heading being collected
struct OpenHeading {
    level: HeadingLevel,
    text: String,
    line: usize,
}

struct Extractor<'a> {
    source: &'a str,
    /// Byte offset where each line starts
    line_starts: Vec<usize>,

    title: Option<String>,
    /// Index 0 is the head
    sections: Vec<ExtractedSection>,
    prose: Vec<String>,

    heading: Option<OpenHeading>,
    code: Option<CodeBlock>,
    item: Option<CommandLine>,
    list_depth: usize,
    paragraph: String,
    paragraph_line: usize,
    /// Byte offset of the open paragraph in the source
    paragraph_start: usize,
    link_targets: Vec<String>,
}

impl<'a> Extractor<'a> {
    fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(offset, _)| offset + 1))
            .collect();

        Self {
            source,
            line_starts,
            title: None,
            sections: vec![ExtractedSection {
                line: 1,
                ..ExtractedSection::default()
            }],
            prose: Vec::new(),
            heading: None,
            code: None,
            item: None,
            list_depth: 0,
            paragraph: String::new(),
            paragraph_line: 1,
            paragraph_start: 0,
            link_targets: Vec::new(),
        }
    }

    fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(index) => index + 1,
            Err(index) => index,
        }
    }

    fn current(&mut self) -> &mut ExtractedSection {
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }

    fn is_head(&self) -> bool {
        self.sections.len() == 1
    }

    fn run(mut self) -> Result<ExtractedPipeline> {
        let source = self.source;

        for (event, range) in Parser::new(source).into_offset_iter() {
            let line = self.line_of(range.start);

            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    self.flush_paragraph()?;
                    self.heading = Some(OpenHeading {
                        level,
                        text: String::new(),
                        line,
                    });
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(heading) = self.heading.take() {
                        self.close_heading(heading);
                    }
                }

                Event::Start(Tag::CodeBlock(kind)) => {
                    self.flush_paragraph()?;
                    let language = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    self.code = Some(CodeBlock {
                        language,
                        content: String::new(),
                        line,
                    });
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(block) = self.code.take() {
                        self.close_code_block(block)?;
                    }
                }

                Event::Start(Tag::List(_)) => {
                    self.flush_paragraph()?;
                    self.list_depth += 1;
                }
                Event::End(TagEnd::List(_)) => {
                    self.list_depth = self.list_depth.saturating_sub(1);
                }
                Event::Start(Tag::Item) => {
                    if self.list_depth <= 1 {
                        self.item = Some(CommandLine {
                            text: String::new(),
                            line,
                        });
                    } else if let Some(item) = self.item.as_mut() {
                        // Nested items are folded into the parent line
                        item.text.push('\n');
                    }
                }
                Event::End(TagEnd::Item) => {
                    if self.list_depth <= 1 {
                        if let Some(mut item) = self.item.take() {
                            item.text = item.text.trim().to_string();
                            if !item.text.is_empty() {
                                self.current().command_lines.push(item);
                            }
                        }
                    }
                }

                Event::Start(Tag::Paragraph) => {
                    if let Some(item) = self.item.as_mut() {
                        if !item.text.trim().is_empty() {
                            item.text.push('\n');
                        }
                    } else {
                        self.flush_paragraph()?;
                        self.paragraph_line = line;
                        self.paragraph_start = range.start;
                    }
                }
                Event::End(TagEnd::Paragraph) => {
                    if self.item.is_none() {
                        self.flush_paragraph()?;
                    }
                }
                Event::End(TagEnd::Table) | Event::End(TagEnd::BlockQuote(..)) => {
                    if self.item.is_none() {
                        self.flush_paragraph()?;
                    }
                }

                Event::Start(Tag::Emphasis) | Event::End(TagEnd::Emphasis) => {
                    self.push_markup("*");
                }
                Event::Start(Tag::Strong) | Event::End(TagEnd::Strong) => {
                    self.push_markup("**");
                }
                Event::Start(Tag::Link { dest_url, .. }) => {
                    self.link_targets.push(dest_url.to_string());
                    self.push_markup("[");
                }
                Event::End(TagEnd::Link) => {
                    let target = self.link_targets.pop().unwrap_or_default();
                    self.push_markup(&format!("]({target})"));
                }

                Event::Text(text) => self.push_text(&text),
                Event::Code(code) => {
                    if let Some(heading) = self.heading.as_mut() {
                        heading.text.push_str(&code);
                    } else {
                        self.push_text(&format!("`{code}`"));
                    }
                }
                Event::SoftBreak | Event::HardBreak => self.push_text("\n"),

                // Comments and raw html never reach the parser
                Event::Html(_) | Event::InlineHtml(_) => {}

                _ => {}
            }
        }

        self.flush_paragraph()?;
        self.close_section();

        let mut sections = self.sections.into_iter();
        let head = sections.next().unwrap_or_default();

        Ok(ExtractedPipeline {
            title: self.title,
            head,
            templates: sections.collect(),
        })
    }

    /// Route inline text to whatever block is open
    fn push_text(&mut self, text: &str) {
        if let Some(heading) = self.heading.as_mut() {
            heading.text.push_str(text);
        } else if let Some(code) = self.code.as_mut() {
            code.content.push_str(text);
        } else if let Some(item) = self.item.as_mut() {
            item.text.push_str(text);
        } else {
            self.paragraph.push_str(text);
        }
    }

    /// Emphasis and link markup is kept in prose only
    fn push_markup(&mut self, markup: &str) {
        if self.heading.is_none() && self.code.is_none() && self.item.is_none() {
            self.paragraph.push_str(markup);
        }
    }

    fn close_heading(&mut self, heading: OpenHeading) {
        let text = heading.text.trim().to_string();

        match heading.level {
            HeadingLevel::H1 if self.title.is_none() => {
                self.title = Some(text);
            }
            HeadingLevel::H2 => {
                self.close_section();
                self.sections.push(ExtractedSection {
                    title: text,
                    line: heading.line,
                    ..ExtractedSection::default()
                });
            }
            level => {
                let depth = heading_depth(level);
                self.prose.push(format!("{} {text}", "#".repeat(depth)));
            }
        }
    }

    fn close_code_block(&mut self, mut block: CodeBlock) -> Result<()> {
        if block.content.ends_with('\n') {
            block.content.pop();
        }

        let is_head = self.is_head();
        let section = self.current();
        if !is_head && !section.code_blocks.is_empty() {
            return Err(ParseError::Markdown {
                line: block.line,
                message: format!(
                    "template {:?} can have only one code block",
                    section.title
                ),
            });
        }

        section.code_blocks.push(block);
        Ok(())
    }

    fn flush_paragraph(&mut self) -> Result<()> {
        let text = std::mem::take(&mut self.paragraph);
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        // An escaped `\->` is prose, so the arrow has to be in the source too
        let written_as_result = self
            .source
            .get(self.paragraph_start..)
            .is_some_and(|rest| rest.trim_start().starts_with("->"));
        let Some(result) = text.strip_prefix("->").filter(|_| written_as_result) else {
            self.prose.push(text.to_string());
            return Ok(());
        };

        let line = self.paragraph_line;
        if self.is_head() {
            return Err(ParseError::Markdown {
                line,
                message: "resulting parameter can only be declared inside a template".to_string(),
            });
        }

        let section = self.current();
        if section.result_parameter.is_some() {
            return Err(ParseError::Markdown {
                line,
                message: format!(
                    "template {:?} declares its resulting parameter more than once",
                    section.title
                ),
            });
        }

        section.result_parameter = Some(result.trim().to_string());
        Ok(())
    }

    fn close_section(&mut self) {
        let prose = std::mem::take(&mut self.prose);
        if !prose.is_empty() {
            self.current().description = Some(prose.join("\n\n"));
        }
    }
}

fn heading_depth(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
