use html5ever::{LocalName, Namespace, QualName};
use kuchiki::{Attribute, ExpandedName, NodeRef};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

pub(crate) fn html_name(tag: &str) -> QualName {
    QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from(tag),
    )
}

pub(crate) fn new_element(tag: &str, attrs: &[(&str, &str)]) -> NodeRef {
    let node = NodeRef::new_element(
        html_name(tag),
        std::iter::empty::<(ExpandedName, Attribute)>(),
    );
    for (name, value) in attrs {
        set_attr(&node, name, value);
    }
    node
}

pub(crate) fn element_with_text(tag: &str, attrs: &[(&str, &str)], text: &str) -> NodeRef {
    let node = new_element(tag, attrs);
    node.append(NodeRef::new_text(text));
    node
}

pub(crate) fn tag_is(node: &NodeRef, tag: &str) -> bool {
    node.as_element()
        .map(|element| element.name.local.as_ref().eq_ignore_ascii_case(tag))
        .unwrap_or(false)
}

pub(crate) fn get_attr(node: &NodeRef, name: &str) -> Option<String> {
    let element = node.as_element()?;
    let attrs = element.attributes.borrow();
    attrs.get(name).map(str::to_string)
}

pub(crate) fn set_attr(node: &NodeRef, name: &str, value: &str) {
    if let Some(element) = node.as_element() {
        element
            .attributes
            .borrow_mut()
            .insert(name, value.to_string());
    }
}

pub(crate) fn has_class(node: &NodeRef, class: &str) -> bool {
    get_attr(node, "class")
        .map(|classes| classes.split_ascii_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

pub(crate) fn add_class(node: &NodeRef, class: &str) {
    if has_class(node, class) {
        return;
    }
    let classes = match get_attr(node, "class") {
        Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
        _ => class.to_string(),
    };
    set_attr(node, "class", &classes);
}

pub(crate) fn remove_class(node: &NodeRef, class: &str) {
    let Some(existing) = get_attr(node, "class") else {
        return;
    };
    let kept: Vec<&str> = existing
        .split_ascii_whitespace()
        .filter(|c| *c != class)
        .collect();
    set_attr(node, "class", &kept.join(" "));
}

/// Sets (`Some`) or clears (`None`) one declaration of the inline `style` attribute,
/// keeping the other declarations in their original order.
pub(crate) fn set_style_property(node: &NodeRef, property: &str, value: Option<&str>) {
    let existing = get_attr(node, "style").unwrap_or_default();
    let mut declarations: Vec<(String, String)> = existing
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect();
    let property = property.to_ascii_lowercase();
    match value {
        Some(value) => match declarations.iter_mut().find(|(name, _)| *name == property) {
            Some(slot) => slot.1 = value.to_string(),
            None => declarations.push((property, value.to_string())),
        },
        None => declarations.retain(|(name, _)| *name != property),
    }
    if declarations.is_empty() {
        if let Some(element) = node.as_element() {
            element.attributes.borrow_mut().remove("style");
        }
        return;
    }
    let style = declarations
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ");
    set_attr(node, "style", &style);
}

pub(crate) fn style_property(node: &NodeRef, property: &str) -> Option<String> {
    let style = get_attr(node, "style")?;
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case(property)
            .then(|| value.trim().to_string())
    })
}

pub(crate) fn select_node(root: &NodeRef, selector: &str) -> Option<NodeRef> {
    root.select_first(selector)
        .ok()
        .map(|element| element.as_node().clone())
}
