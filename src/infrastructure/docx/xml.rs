//! 可修改的 XML 树
//!
//! 用 quick-xml 把部件读成一棵树，修改后再原样写回。
//! 元素名保留前缀（如 `w:p`），不做命名空间解析。

use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{AppError, AppResult};

/// 树中的节点路径（从根元素开始的子节点下标）
pub type NodePath = Vec<usize>;

/// XML 节点
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

/// XML 元素
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// XML 文档（只保留根元素，声明在写回时统一生成）
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// 直接子元素（带下标）
    pub fn child_elements(&self) -> impl Iterator<Item = (usize, &XmlElement)> {
        self.children.iter().enumerate().filter_map(|(i, n)| match n {
            XmlNode::Element(e) => Some((i, e)),
            _ => None,
        })
    }

    /// 指定名称的直接子元素下标
    pub fn child_indices(&self, name: &str) -> Vec<usize> {
        self.child_elements()
            .filter(|(_, e)| e.name == name)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn first_child(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements()
            .find(|(_, e)| e.name == name)
            .map(|(_, e)| e)
    }

    pub fn first_child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|n| match n {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    pub fn child_at(&self, index: usize) -> Option<&XmlElement> {
        match self.children.get(index) {
            Some(XmlNode::Element(e)) => Some(e),
            _ => None,
        }
    }

    pub fn child_at_mut(&mut self, index: usize) -> Option<&mut XmlElement> {
        match self.children.get_mut(index) {
            Some(XmlNode::Element(e)) => Some(e),
            _ => None,
        }
    }

    /// 按路径查找后代元素
    pub fn at_path(&self, path: &[usize]) -> Option<&XmlElement> {
        path.iter().try_fold(self, |el, &i| el.child_at(i))
    }

    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        let mut current = self;
        for &i in path {
            current = current.child_at_mut(i)?;
        }
        Some(current)
    }

    /// 是否存在指定名称的后代元素（不含自身）
    pub fn has_descendant(&self, name: &str) -> bool {
        self.child_elements()
            .any(|(_, e)| e.name == name || e.has_descendant(name))
    }

    /// 深度优先遍历所有后代元素
    pub fn for_each_descendant<'a>(&'a self, f: &mut impl FnMut(&'a XmlElement)) {
        for (_, child) in self.child_elements() {
            f(child);
            child.for_each_descendant(f);
        }
    }

    /// 子节点中的文本拼接
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                XmlNode::Text(t) | XmlNode::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// 删除满足条件的直接子元素，返回删除数量
    pub fn remove_children_where(&mut self, mut pred: impl FnMut(&XmlElement) -> bool) -> usize {
        let before = self.children.len();
        self.children.retain(|n| match n {
            XmlNode::Element(e) => !pred(e),
            _ => true,
        });
        before - self.children.len()
    }

    /// 按架构规定的子元素顺序插入或替换子元素
    ///
    /// `order` 为父元素允许的子元素名称顺序；未列出的元素视为排在最后。
    pub fn upsert_ordered(&mut self, child: XmlElement, order: &[&str]) {
        if let Some(existing) = self.first_child_mut(&child.name) {
            *existing = child;
            return;
        }
        let rank = |name: &str| order.iter().position(|n| *n == name).unwrap_or(order.len());
        let new_rank = rank(&child.name);
        let insert_at = self
            .children
            .iter()
            .position(|n| matches!(n, XmlNode::Element(e) if rank(&e.name) > new_rank))
            .unwrap_or(self.children.len());
        self.children.insert(insert_at, XmlNode::Element(child));
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attributes {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape(v.as_str()));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(e) => e.write_to(out),
                XmlNode::Text(t) => out.push_str(&partial_escape(t.as_str())),
                XmlNode::CData(t) => {
                    out.push_str("<![CDATA[");
                    out.push_str(t);
                    out.push_str("]]>");
                }
                XmlNode::Comment(t) => {
                    out.push_str("<!--");
                    out.push_str(t);
                    out.push_str("-->");
                }
                XmlNode::ProcessingInstruction(t) => {
                    out.push_str("<?");
                    out.push_str(t);
                    out.push_str("?>");
                }
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    /// 序列化为不带声明的 XML 片段
    pub fn to_xml_fragment(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }
}

impl XmlDocument {
    /// 解析完整的 XML 文档
    ///
    /// # 参数
    /// - `part`: 部件名（仅用于错误信息）
    /// - `xml`: XML 文本
    pub fn parse(part: &str, xml: &str) -> AppResult<Self> {
        let root = parse_element(part, xml)?;
        Ok(Self { root })
    }

    /// 序列化为带声明的 XML 文本
    pub fn to_xml(&self) -> String {
        let mut out =
            String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n");
        self.root.write_to(&mut out);
        out
    }
}

/// 解析 XML 片段，返回唯一的根元素
pub fn parse_element(part: &str, xml: &str) -> AppResult<XmlElement> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| AppError::malformed_xml(part, e))?;
        match event {
            Event::Start(e) => stack.push(element_from(part, &reader, &e)?),
            Event::Empty(e) => {
                let element = element_from(part, &reader, &e)?;
                attach(part, &mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| AppError::malformed_xml(part, "多余的结束标签"))?;
                attach(part, &mut stack, &mut root, element)?;
            }
            Event::Text(t) => {
                if let Some(parent) = stack.last_mut() {
                    let text = t.unescape().map_err(|e| AppError::malformed_xml(part, e))?;
                    parent.children.push(XmlNode::Text(text.into_owned()));
                }
            }
            Event::CData(c) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    parent.children.push(XmlNode::CData(text));
                }
            }
            Event::Comment(c) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&c).into_owned();
                    parent.children.push(XmlNode::Comment(text));
                }
            }
            Event::PI(p) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&p).into_owned();
                    parent.children.push(XmlNode::ProcessingInstruction(text));
                }
            }
            Event::Decl(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if !stack.is_empty() {
        return Err(AppError::malformed_xml(part, "存在未闭合的元素"));
    }
    root.ok_or_else(|| AppError::malformed_xml(part, "没有根元素"))
}

fn element_from<B>(
    part: &str,
    reader: &Reader<B>,
    start: &BytesStart<'_>,
) -> AppResult<XmlElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| AppError::malformed_xml(part, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .decode_and_unescape_value(reader)
            .map_err(|e| AppError::malformed_xml(part, e))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    part: &str,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> AppResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(AppError::malformed_xml(part, "存在多个根元素")),
    }
    Ok(())
}
