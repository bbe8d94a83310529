//! Raw text labelled with contexts, and the predicates a later
//! Content-Security-Policy pass queries it with.

use crate::context::{AttributeType, Context, ElementType, State};

/// A byte range of raw text and the context it starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSlice {
    pub start: usize,
    pub end: usize,
    pub context: Context,
}

/// A raw text run cut into ordered, non-overlapping slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlicedText {
    slices: Vec<TextSlice>,
    end_context: Context,
}

pub type ContextPredicate = fn(&Context) -> bool;

impl SlicedText {
    pub fn new(slices: Vec<TextSlice>, end_context: Context) -> Self {
        debug_assert!(
            slices.windows(2).all(|w| w[0].end <= w[1].start),
            "slices must be ordered and disjoint"
        );
        Self {
            slices,
            end_context,
        }
    }

    pub fn slices(&self) -> &[TextSlice] {
        &self.slices
    }

    /// Context after the last byte.
    pub fn end_context(&self) -> Context {
        self.end_context
    }

    /// Slices whose own context satisfies `slice`, the preceding slice's
    /// context satisfies `prev` and the following slice's (or, for the last
    /// one, the end context) satisfies `next`. A `None` predicate accepts
    /// anything, including the absence of a preceding slice.
    pub fn find(
        &self,
        prev: Option<ContextPredicate>,
        slice: Option<ContextPredicate>,
        next: Option<ContextPredicate>,
    ) -> Vec<&TextSlice> {
        let accepts = |predicate: Option<ContextPredicate>, context: Option<&Context>| {
            predicate.is_none_or(|p| context.is_some_and(p))
        };
        self.slices
            .iter()
            .enumerate()
            .filter(|&(i, current)| {
                let before = i.checked_sub(1).map(|j| &self.slices[j].context);
                let after = self
                    .slices
                    .get(i + 1)
                    .map_or(&self.end_context, |s| &s.context);
                accepts(prev, before)
                    && accepts(slice, Some(&current.context))
                    && accepts(next, Some(after))
            })
            .map(|(_, current)| current)
            .collect()
    }
}

/// Inside a `<script>` or `<style>` open tag, outside any attribute.
pub fn in_script_or_style_tag(context: &Context) -> bool {
    matches!(
        context.element_type(),
        ElementType::Script | ElementType::Style
    ) && context.state() == State::HtmlTag
        && context.attribute_type() == AttributeType::None
}

/// Between the end of a `<script>` or `<style>` open tag and its end tag.
pub fn in_script_or_style_body(context: &Context) -> bool {
    context.attribute_type() == AttributeType::None
        && matches!(context.state(), State::Js | State::Css)
}

/// Right before an attribute value, where an opening quote may follow.
pub fn html_before_attribute_value(context: &Context) -> bool {
    context.state() == State::HtmlBeforeAttributeValue
}

/// Inside an inline event handler or `style` attribute value.
pub fn in_script_or_style_attr_value(context: &Context) -> bool {
    context.element_type() != ElementType::None
        && matches!(
            (context.attribute_type(), context.state()),
            (AttributeType::Script, State::Js) | (AttributeType::Style, State::Css)
        )
}
