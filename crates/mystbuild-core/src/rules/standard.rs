// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Built-in rules for docutils document trees.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Rule, RuleSet, Visit};
use crate::doctree::NodeRef;
use crate::error::{TransformError, TransformResult};
use crate::mdast::MdNode;
use crate::transform::EnterContext;

pub(super) fn register_all(rules: &mut RuleSet) {
    rules
        .register("document", document)
        .register("section", section)
        .register("title", title)
        .register("paragraph", paragraph)
        .register("Text", text)
        .register("inline", inline)
        .register("reference", reference)
        .register("target", target)
        .register("emphasis", emphasis)
        .register("strong", strong)
        .register("literal", literal)
        .register("literal_block", literal_block)
        .register("bullet_list", bullet_list)
        .register("enumerated_list", enumerated_list)
        .register("list_item", list_item)
        .register("block_quote", block_quote)
        .register("transition", transition)
        .register("comment", comment);

    for kind in AdmonitionKind::ALL {
        rules.register(kind.as_str(), Admonition(kind));
    }
}

// ============================================================================
// Structure
// ============================================================================

/// `document` -> `root`. Publishes itself as the traversal root once the
/// whole tree has been attached.
fn document(_node: NodeRef<'_>, _cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    Ok(Visit::node(MdNode::parent("root")).on_exit(|cx| cx.publish_root()))
}

fn section(_node: NodeRef<'_>, cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    cx.state_mut().section_depth += 1;
    Ok(Visit::node(MdNode::parent("block")).on_exit(|cx| {
        let state = cx.state_mut();
        state.section_depth = state.section_depth.saturating_sub(1);
        Ok(())
    }))
}

/// `title` -> `heading`. The depth counter stays raised for the heading's
/// whole subtree.
fn title(_node: NodeRef<'_>, cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    let depth = cx.state().next_heading_level();
    cx.state_mut().heading_depth += 1;
    Ok(
        Visit::node(MdNode::parent("heading").with("depth", depth)).on_exit(|cx| {
            let state = cx.state_mut();
            state.heading_depth = state.heading_depth.saturating_sub(1);
            Ok(())
        }),
    )
}

fn paragraph(_node: NodeRef<'_>, _cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    Ok(Visit::node(MdNode::parent("paragraph")))
}

fn block_quote(_node: NodeRef<'_>, _cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    Ok(Visit::node(MdNode::parent("blockquote")))
}

fn transition(_node: NodeRef<'_>, _cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    Ok(Visit::node(MdNode::leaf("thematicBreak")))
}

fn bullet_list(_node: NodeRef<'_>, _cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    Ok(Visit::node(MdNode::parent("list").with("ordered", false)))
}

fn enumerated_list(node: NodeRef<'_>, _cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    let mut list = MdNode::parent("list").with("ordered", true);
    if let Some(start) = node.attr("start").and_then(Value::as_u64) {
        list.set("start", start);
    }
    Ok(Visit::node(list))
}

fn list_item(_node: NodeRef<'_>, _cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    Ok(Visit::node(MdNode::parent("listItem")))
}

fn comment(_node: NodeRef<'_>, _cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    Ok(Visit::none().skip_children())
}

// ============================================================================
// Inline
// ============================================================================

fn text(node: NodeRef<'_>, _cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    Ok(Visit::node(MdNode::text(node.text().unwrap_or_default())))
}

/// `inline` -> `span`. The `classes` list is flattened into mdast's string
/// `class` field, space-joined, and left out when the list is empty.
fn inline(node: NodeRef<'_>, _cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    let mut span = MdNode::parent("span");
    let classes = node.attr_list("classes");
    if !classes.is_empty() {
        span.set("class", classes.join(" "));
    }
    Ok(Visit::node(span))
}

fn emphasis(_node: NodeRef<'_>, _cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    Ok(Visit::node(MdNode::parent("emphasis")))
}

fn strong(_node: NodeRef<'_>, _cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    Ok(Visit::node(MdNode::parent("strong")))
}

fn literal(node: NodeRef<'_>, _cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    Ok(Visit::node(MdNode::leaf("inlineCode").with("value", node.astext())).skip_children())
}

fn literal_block(node: NodeRef<'_>, _cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    let mut code = MdNode::leaf("code");
    if let Some(lang) = node.attr_str("language") {
        code.set("lang", lang);
    }
    code.set("value", node.astext());
    Ok(Visit::node(code).skip_children())
}

// ============================================================================
// References and anchors
// ============================================================================

/// `reference` -> `link`. Only references into the current document are
/// supported.
fn reference(node: NodeRef<'_>, _cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    if !node.attr_flag("internal") {
        return Err(TransformError::UnsupportedReferenceKind {
            refuri: node.attr_str("refuri").map(str::to_owned),
            node: node.id(),
        });
    }
    let refid = node
        .attr_str("refid")
        .ok_or_else(|| TransformError::MissingAttribute {
            tag: node.tag().to_string(),
            attribute: "refid",
            node: node.id(),
        })?;
    Ok(Visit::node(
        MdNode::parent("link").with("url", format!("#{refid}")),
    ))
}

/// `target` produces nothing itself; it stamps its anchor onto the next
/// sibling that produces a result.
///
/// A result that already carries an `id` (claimed by an earlier target) is
/// declined, leaving the anchor for the sibling after it.
fn target(node: NodeRef<'_>, cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
    let anchor = node
        .attr_str("refid")
        .or_else(|| node.attr_list("ids").first().copied());
    let Some(anchor) = anchor.map(str::to_owned) else {
        return Ok(Visit::none());
    };

    cx.set_sibling_action(move |_node, result| {
        if result.id().is_some() {
            return false;
        }
        result.set("id", anchor.clone());
        true
    });
    Ok(Visit::none())
}

// ============================================================================
// Admonitions
// ============================================================================

/// The fixed set of admonition directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmonitionKind {
    Attention,
    Caution,
    Danger,
    Error,
    Hint,
    Important,
    Note,
    Tip,
    Warning,
}

impl AdmonitionKind {
    pub const ALL: [AdmonitionKind; 9] = [
        AdmonitionKind::Attention,
        AdmonitionKind::Caution,
        AdmonitionKind::Danger,
        AdmonitionKind::Error,
        AdmonitionKind::Hint,
        AdmonitionKind::Important,
        AdmonitionKind::Note,
        AdmonitionKind::Tip,
        AdmonitionKind::Warning,
    ];

    /// Source tag and `kind` value.
    pub fn as_str(self) -> &'static str {
        match self {
            AdmonitionKind::Attention => "attention",
            AdmonitionKind::Caution => "caution",
            AdmonitionKind::Danger => "danger",
            AdmonitionKind::Error => "error",
            AdmonitionKind::Hint => "hint",
            AdmonitionKind::Important => "important",
            AdmonitionKind::Note => "note",
            AdmonitionKind::Tip => "tip",
            AdmonitionKind::Warning => "warning",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        AdmonitionKind::ALL.into_iter().find(|k| k.as_str() == tag)
    }
}

impl fmt::Display for AdmonitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Admonition(AdmonitionKind);

impl Rule for Admonition {
    fn enter(&self, _node: NodeRef<'_>, _cx: &mut EnterContext<'_>) -> TransformResult<Visit> {
        Ok(Visit::node(
            MdNode::parent("admonition").with("kind", self.0.as_str()),
        ))
    }
}
