//! Reading and writing syntax trees as XML.
//!
//! Every node becomes an element named after its rule, with a `rule-id` attribute.
//! Every token becomes an element named after its kind, with `start-line`,
//! `start-col`, `end-line` and `end-col` attributes, a `hidden="true"` attribute
//! if it is on the hidden channel, and its exact text as content:
//!
//! ```xml
//! <compilationUnit rule-id="1">
//!   <CLASS start-line="1" start-col="0" end-line="1" end-col="4">class</CLASS>
//!   <TOKENS rule-id="0">
//!     <WS start-line="1" start-col="5" end-line="1" end-col="5" hidden="true"> </WS>
//!   </TOKENS>
//! </compilationUnit>
//! ```
//!
//! There are no generic `<TOKEN>` or `<HIDDEN>` wrapper elements: a token’s element
//! name is always its kind, and the channel lives in the `hidden` attribute.
//! Consumers that need to tell tokens from nodes look for `rule-id`.

use crate::{
    Channel, Error, LineColumn, Result, RuleId, Span, SyntaxBuilder, SyntaxTree, WalkEvent,
};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::str::{self, FromStr};
use tracing::debug;

mod escape;

const RULE_ID: &str = "rule-id";
const START_LINE: &str = "start-line";
const START_COL: &str = "start-col";
const END_LINE: &str = "end-line";
const END_COL: &str = "end-col";
const HIDDEN: &str = "hidden";

impl SyntaxTree {
    /// Serializes this tree to XML.
    ///
    /// Fails with [`Error::InvalidXmlName`] if a rule name or token kind
    /// cannot be used as an element name.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        for event in self.root().preorder(self) {
            match event {
                WalkEvent::Enter(node) => {
                    let name = checked_name(node.name(self))?;
                    let mut start = BytesStart::new(name);
                    start.push_attribute((RULE_ID, node.rule_id(self).to_string().as_str()));
                    writer.write_event(Event::Start(start))?;
                }
                WalkEvent::Token(token) => {
                    let kind = checked_name(token.kind(self))?;
                    let span = token.span(self);
                    let mut start = BytesStart::new(kind);
                    start.push_attribute((START_LINE, span.start.line.to_string().as_str()));
                    start.push_attribute((START_COL, span.start.column.to_string().as_str()));
                    start.push_attribute((END_LINE, span.end.line.to_string().as_str()));
                    start.push_attribute((END_COL, span.end.column.to_string().as_str()));
                    if token.channel(self) == Channel::Hidden {
                        start.push_attribute((HIDDEN, "true"));
                    }

                    let text = token.text(self);
                    if text.is_empty() {
                        writer.write_event(Event::Empty(start))?;
                    } else {
                        writer.write_event(Event::Start(start))?;
                        let text = BytesText::from_escaped(escape::escape(text));
                        writer.write_event(Event::Text(text))?;
                        writer.write_event(Event::End(BytesEnd::new(kind)))?;
                    }
                }
                WalkEvent::Leave(node) => {
                    writer.write_event(Event::End(BytesEnd::new(node.name(self))))?;
                }
            }
        }

        let mut xml = String::from_utf8(writer.into_inner())
            .map_err(|err| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))?;
        xml.push('\n');
        Ok(xml)
    }

    /// Parses a tree from XML produced by [`SyntaxTree::to_xml`].
    ///
    /// Whitespace between elements is ignored.
    /// Anything that does not describe a tree fails with [`Error::MalformedTree`].
    pub fn from_xml(xml: &str) -> Result<SyntaxTree> {
        let tree = XmlTreeReader::new(xml).read()?;
        debug!(bytes = xml.len(), "read tree from XML");
        Ok(tree)
    }
}

fn checked_name(name: &str) -> Result<&str> {
    if escape::is_name(name) {
        Ok(name)
    } else {
        Err(Error::InvalidXmlName { name: name.to_owned() })
    }
}

/// A token element whose end tag has not been read yet.
struct OpenToken {
    kind: String,
    channel: Channel,
    span: Span,
    text: String,
}

enum Element {
    Node { name: String, rule_id: RuleId },
    Token { kind: String, channel: Channel, span: Span },
}

struct XmlTreeReader<'a> {
    reader: Reader<&'a [u8]>,
    builder: SyntaxBuilder,
    open_token: Option<OpenToken>,
    is_root_finished: bool,
}

impl<'a> XmlTreeReader<'a> {
    fn new(xml: &'a str) -> Self {
        Self {
            reader: Reader::from_str(xml),
            builder: SyntaxBuilder::new(),
            open_token: None,
            is_root_finished: false,
        }
    }

    fn read(mut self) -> Result<SyntaxTree> {
        loop {
            let event = self.reader.read_event().map_err(|err| self.error(err.to_string()))?;
            match event {
                Event::Start(start) => match self.element(&start)? {
                    Element::Node { name, rule_id } => self.start_node(&name, rule_id)?,
                    Element::Token { kind, channel, span } => {
                        self.check_token_parent(&kind)?;
                        let text = String::new();
                        self.open_token = Some(OpenToken { kind, channel, span, text });
                    }
                },
                Event::Empty(start) => match self.element(&start)? {
                    Element::Node { name, rule_id } => {
                        self.start_node(&name, rule_id)?;
                        self.finish_node();
                    }
                    Element::Token { kind, channel, span } => {
                        self.check_token_parent(&kind)?;
                        self.builder.add_token(&kind, "", channel, span);
                    }
                },
                Event::End(end) => {
                    if let Some(token) = self.open_token.take() {
                        debug_assert_eq!(end.name().as_ref(), token.kind.as_bytes());
                        self.builder.add_token(&token.kind, &token.text, token.channel, token.span);
                    } else {
                        self.finish_node();
                    }
                }
                Event::Text(text) => {
                    let bytes = text.into_inner();
                    let raw = utf8(&bytes).map_err(|message| self.error(message))?;
                    let text = escape::unescape(&raw).map_err(|message| self.error(message))?;
                    self.push_text(&text)?;
                }
                Event::CData(cdata) => {
                    let bytes = cdata.into_inner();
                    let text = utf8(&bytes).map_err(|message| self.error(message))?;
                    self.push_text(&text)?;
                }
                Event::Eof => break,
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            }
        }

        if self.open_token.is_some() || self.builder.nesting() > 0 {
            return Err(self.error("unexpected end of document inside an element"));
        }
        if !self.is_root_finished {
            return Err(self.error("document has no root element"));
        }
        Ok(self.builder.finish())
    }

    fn start_node(&mut self, name: &str, rule_id: RuleId) -> Result<()> {
        if let Some(token) = &self.open_token {
            return Err(self.error(format!("element `{name}` inside token `{}`", token.kind)));
        }
        if self.is_root_finished {
            return Err(self.error(format!("second root element `{name}`")));
        }
        self.builder.start_node(name, rule_id);
        Ok(())
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
        if self.builder.nesting() == 0 {
            self.is_root_finished = true;
        }
    }

    fn check_token_parent(&self, kind: &str) -> Result<()> {
        if let Some(token) = &self.open_token {
            return Err(self.error(format!("element `{kind}` inside token `{}`", token.kind)));
        }
        if self.builder.nesting() == 0 {
            return Err(self.error(format!("token `{kind}` outside of any node")));
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) -> Result<()> {
        if let Some(token) = &mut self.open_token {
            token.text.push_str(text);
            return Ok(());
        }
        if text.chars().all(char::is_whitespace) {
            return Ok(());
        }
        if self.builder.nesting() == 0 {
            return Err(self.error("text outside of the root element"));
        }
        Err(self.error(format!("text {text:?} directly inside a node")))
    }

    fn element(&self, start: &BytesStart<'_>) -> Result<Element> {
        let name = utf8(start.name().as_ref()).map_err(|message| self.error(message))?.into_owned();

        let mut rule_id = None;
        let (mut start_line, mut start_col, mut end_line, mut end_col) = (None, None, None, None);
        let mut hidden = None;

        for attribute in start.attributes() {
            let attribute = attribute.map_err(|err| self.error(err.to_string()))?;
            let key = utf8(attribute.key.as_ref()).map_err(|message| self.error(message))?;
            let raw = utf8(&attribute.value).map_err(|message| self.error(message))?;
            let value = escape::unescape(&raw).map_err(|message| self.error(message))?;

            match &*key {
                RULE_ID => rule_id = Some(self.number(&name, &key, &value)?),
                START_LINE => start_line = Some(self.number(&name, &key, &value)?),
                START_COL => start_col = Some(self.number(&name, &key, &value)?),
                END_LINE => end_line = Some(self.number(&name, &key, &value)?),
                END_COL => end_col = Some(self.number(&name, &key, &value)?),
                HIDDEN => hidden = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(rule_id) = rule_id {
            return Ok(Element::Node { name, rule_id });
        }

        let (Some(start_line), Some(start_col), Some(end_line), Some(end_col)) =
            (start_line, start_col, end_line, end_col)
        else {
            let message = if (start_line, end_line) == (None, None)
                && (start_col, end_col) == (None, None)
            {
                format!("element `{name}` has neither a `{RULE_ID}` nor position attributes")
            } else {
                format!("token `{name}` is missing a position attribute")
            };
            return Err(self.error(message));
        };

        let channel = match hidden.as_deref() {
            None | Some("false") => Channel::Visible,
            Some("true") => Channel::Hidden,
            Some(other) => {
                return Err(self.error(format!("invalid `{HIDDEN}` value {other:?} on `{name}`")))
            }
        };

        let span = Span {
            start: LineColumn::new(start_line, start_col),
            end: LineColumn::new(end_line, end_col),
        };
        Ok(Element::Token { kind: name, channel, span })
    }

    fn number<T: FromStr>(&self, element: &str, key: &str, value: &str) -> Result<T> {
        value.parse().map_err(|_| {
            self.error(format!("`{key}` of `{element}` is not a valid number: {value:?}"))
        })
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::malformed(format!("{} (at byte {})", message.into(), self.reader.buffer_position()))
    }
}

fn utf8(bytes: &[u8]) -> Result<Cow<'_, str>, String> {
    str::from_utf8(bytes).map(Cow::Borrowed).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ParseMode, RawToken, RuleEvent, TreeBuilder};
    use expect_test::expect;
    use indoc::indoc;

    fn build(tokens: &[(&str, &str, Channel)], events: &[RuleEvent<'_>]) -> SyntaxTree {
        let mut start = LineColumn::START;
        let tokens: Vec<_> = tokens
            .iter()
            .map(|&(kind, text, channel)| {
                let token = RawToken { kind, text, channel, start };
                start = start.advance(text);
                token
            })
            .collect();
        TreeBuilder::build(&tokens, events, ParseMode::Strict).unwrap()
    }

    fn class_k() -> SyntaxTree {
        build(
            &[
                ("CLASS", "class", Channel::Visible),
                ("WS", " ", Channel::Hidden),
                ("ID", "K", Channel::Visible),
                ("WS", "\t", Channel::Hidden),
                ("EOF", "", Channel::Visible),
            ],
            &[
                RuleEvent::Enter { name: "compilationUnit", rule_id: 1 },
                RuleEvent::Enter { name: "classDeclaration", rule_id: 2 },
                RuleEvent::Token(0),
                RuleEvent::Token(2),
                RuleEvent::Exit,
                RuleEvent::Token(4),
                RuleEvent::Exit,
            ],
        )
    }

    fn special_text() -> SyntaxTree {
        build(
            &[
                ("ID", "a", Channel::Visible),
                ("COMMENT", "/* <&> ]]> \"' */\r\n", Channel::Hidden),
                ("STRING", "\"\u{0}\u{1B}\u{FFFE}ü\"", Channel::Visible),
                ("WS", "\n  \n", Channel::Hidden),
            ],
            &[
                RuleEvent::Enter { name: "root", rule_id: 7 },
                RuleEvent::Token(0),
                RuleEvent::Token(2),
                RuleEvent::Exit,
            ],
        )
    }

    fn malformed(xml: &str) -> String {
        match SyntaxTree::from_xml(xml) {
            Err(Error::MalformedTree { message }) => message,
            other => panic!("expected malformed tree error, got {other:?}"),
        }
    }

    #[test]
    fn write() {
        expect![[r#"
            <compilationUnit rule-id="1">
              <classDeclaration rule-id="2">
                <CLASS start-line="1" start-col="0" end-line="1" end-col="4">class</CLASS>
                <TOKENS rule-id="0">
                  <WS start-line="1" start-col="5" end-line="1" end-col="5" hidden="true"> </WS>
                </TOKENS>
                <ID start-line="1" start-col="6" end-line="1" end-col="6">K</ID>
              </classDeclaration>
              <TOKENS rule-id="0">
                <WS start-line="1" start-col="7" end-line="1" end-col="7" hidden="true">	</WS>
              </TOKENS>
              <EOF start-line="1" start-col="8" end-line="1" end-col="7"/>
            </compilationUnit>
        "#]]
        .assert_eq(&class_k().to_xml().unwrap());
    }

    #[test]
    fn tokens_are_named_by_kind() {
        let xml = special_text().to_xml().unwrap();
        assert!(!xml.contains("<TOKEN ") && !xml.contains("<HIDDEN "), "{xml}");
        assert!(xml.contains("<COMMENT start-line=\"1\" start-col=\"1\""), "{xml}");

        let tree = SyntaxTree::from_xml(&xml).unwrap();
        let kinds: Vec<_> =
            tree.root().descendant_tokens(&tree).map(|token| token.kind(&tree)).collect();
        assert_eq!(kinds, ["ID", "COMMENT", "STRING", "WS"]);
    }

    #[test]
    fn write_escapes_text() {
        let xml = special_text().to_xml().unwrap();
        assert!(xml.contains(">/* &lt;&amp;&gt; ]]&gt; \"' */&#xD;\n</COMMENT>"), "{xml}");
        assert!(xml.contains(">\"&#x0;&#x1B;&#xFFFE;ü\"</STRING>"), "{xml}");
        assert!(xml.contains(" hidden=\"true\">\n  \n</WS>"), "{xml}");
    }

    #[test]
    fn round_trip() {
        for tree in [class_k(), special_text()] {
            let xml = tree.to_xml().unwrap();
            let read = SyntaxTree::from_xml(&xml).unwrap();
            assert_eq!(read, tree);
            assert_eq!(read.text(), tree.text());
            assert_eq!(read.to_xml().unwrap(), xml);
        }
    }

    #[test]
    fn read_ignores_layout_and_comments() {
        let xml = indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <!-- generated -->
            <compilationUnit rule-id="1"><classDeclaration rule-id="2">
            <CLASS start-line="1" start-col="0" end-line="1" end-col="4">class</CLASS>

                  <TOKENS rule-id="0"><WS hidden="true" start-line="1" start-col="5" end-line="1" end-col="5"> </WS></TOKENS>
              <ID start-line="1" start-col="6" end-line="1" end-col="6"><![CDATA[K]]></ID>
            </classDeclaration><TOKENS rule-id="0">
              <WS start-line="1" start-col="7" end-line="1" end-col="7" hidden="true">&#9;</WS>
            </TOKENS><EOF start-line="1" start-col="8" end-line="1" end-col="7"></EOF></compilationUnit>
        "#};
        assert_eq!(SyntaxTree::from_xml(xml).unwrap(), class_k());
    }

    #[test]
    fn explicit_visible_channel() {
        let tree = SyntaxTree::from_xml(
            r#"<r rule-id="3"><X start-line="1" start-col="0" end-line="1" end-col="0" hidden="false">x</X></r>"#,
        )
        .unwrap();
        let token = tree.root().child_tokens(&tree).next().unwrap();
        assert_eq!(token.channel(&tree), Channel::Visible);
        assert_eq!(tree.root().rule_id(&tree), 3);
    }

    #[test]
    fn invalid_names() {
        let tree = build(
            &[("'+'", "+", Channel::Visible)],
            &[RuleEvent::Enter { name: "expr", rule_id: 1 }, RuleEvent::Token(0), RuleEvent::Exit],
        );
        let error = tree.to_xml().unwrap_err();
        assert!(matches!(&error, Error::InvalidXmlName { name } if name == "'+'"));
        assert_eq!(error.to_string(), "`'+'` is not a valid XML name");
    }

    #[test]
    fn malformed_documents() {
        const POS: &str = r#"start-line="1" start-col="0" end-line="1" end-col="0""#;

        let cases = [
            ("", "document has no root element".to_owned()),
            ("  <!-- only a comment -->\n", "document has no root element".to_owned()),
            (r#"<a rule-id="1"/><b rule-id="2"/>"#, "second root element `b`".to_owned()),
            (format!("<X {POS}>x</X>").leak(), "token `X` outside of any node".to_owned()),
            (r#"text<a rule-id="1"/>"#, "text outside of the root element".to_owned()),
            (r#"<a rule-id="1">text</a>"#, "text \"text\" directly inside a node".to_owned()),
            (
                r#"<a rule-id="1"><X>x</X></a>"#,
                "element `X` has neither a `rule-id` nor position attributes".to_owned(),
            ),
            (
                r#"<a rule-id="1"><X start-line="1" start-col="0" end-line="1">x</X></a>"#,
                "token `X` is missing a position attribute".to_owned(),
            ),
            (r#"<a rule-id="x"/>"#, "`rule-id` of `a` is not a valid number: \"x\"".to_owned()),
            (
                r#"<a rule-id="1"><X start-line="-1" start-col="0" end-line="1" end-col="0"/></a>"#,
                "`start-line` of `X` is not a valid number: \"-1\"".to_owned(),
            ),
            (
                format!(r#"<a rule-id="1"><X {POS} hidden="yes">x</X></a>"#).leak(),
                "invalid `hidden` value \"yes\" on `X`".to_owned(),
            ),
            (
                format!(r#"<a rule-id="1"><X {POS}><b rule-id="2"/></X></a>"#).leak(),
                "element `b` inside token `X`".to_owned(),
            ),
            (
                format!(r#"<a rule-id="1"><X {POS}><Y {POS}/></X></a>"#).leak(),
                "element `Y` inside token `X`".to_owned(),
            ),
            (
                format!(r#"<a rule-id="1"><X {POS}>&nbsp;</X></a>"#).leak(),
                "unknown entity `&nbsp;`".to_owned(),
            ),
        ];

        for (xml, expected) in cases {
            let message = malformed(xml);
            assert!(message.contains(&expected), "{xml:?}: {message:?} does not mention {expected:?}");
        }
    }

    #[test]
    fn malformed_nesting() {
        malformed(r#"<a rule-id="1"><b rule-id="2"></a>"#);
        malformed(r#"<a rule-id="1"><b rule-id="2"/>"#);
        malformed(r#"<a rule-id="1"></b>"#);
        malformed(r#"<a rule-id="1"><X start-line="1" start-col="0" end-line="1" end-col="0">x"#);
    }
}
