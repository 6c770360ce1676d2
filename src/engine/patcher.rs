//! Patcher - Applies document primitives and records them.
//!
//! Each call forwards to the [`Document`] and appends the matching
//! [`Mutation`] to the pass log. Nothing reaches the document any other way.

use std::rc::Rc;

use tracing::trace;

use super::mutation::{CreatedNode, LifecycleHook, Mutation, MutationLog};
use crate::component::InstanceId;
use crate::document::Document;
use crate::error::DocumentError;
use crate::types::{NodeId, Value};

pub(crate) struct Patcher<'a, D: Document> {
    document: &'a mut D,
    log: MutationLog,
    trace: bool,
}

impl<'a, D: Document> Patcher<'a, D> {
    pub fn new(document: &'a mut D, trace: bool) -> Self {
        Self {
            document,
            log: MutationLog::new(),
            trace,
        }
    }

    fn record(&mut self, mutation: Mutation) {
        if self.trace {
            trace!(?mutation, "mutation");
        }
        self.log.push(mutation);
    }

    pub fn create_element(
        &mut self,
        tag: &Rc<str>,
        parent: NodeId,
        before: Option<NodeId>,
    ) -> Result<NodeId, DocumentError> {
        let handle = self.document.create_element(tag)?;
        self.document.insert_before(parent, handle, before)?;
        self.record(Mutation::CreateNode {
            handle,
            node: CreatedNode::Element(tag.clone()),
            parent,
            before,
        });
        Ok(handle)
    }

    pub fn create_text(
        &mut self,
        value: &str,
        parent: NodeId,
        before: Option<NodeId>,
    ) -> Result<NodeId, DocumentError> {
        let handle = self.document.create_text(value)?;
        self.document.insert_before(parent, handle, before)?;
        self.record(Mutation::CreateNode {
            handle,
            node: CreatedNode::Text(value.to_string()),
            parent,
            before,
        });
        Ok(handle)
    }

    pub fn set_attribute(
        &mut self,
        handle: NodeId,
        name: &Rc<str>,
        value: &Value,
    ) -> Result<(), DocumentError> {
        self.document.set_attribute(handle, name, value)?;
        self.record(Mutation::SetAttribute {
            handle,
            name: name.clone(),
            value: value.clone(),
        });
        Ok(())
    }

    pub fn remove_attribute(&mut self, handle: NodeId, name: &Rc<str>) -> Result<(), DocumentError> {
        self.document.remove_attribute(handle, name)?;
        self.record(Mutation::RemoveAttribute {
            handle,
            name: name.clone(),
        });
        Ok(())
    }

    pub fn set_text(&mut self, handle: NodeId, value: &str) -> Result<(), DocumentError> {
        self.document.set_text(handle, value)?;
        self.record(Mutation::SetText {
            handle,
            value: value.to_string(),
        });
        Ok(())
    }

    pub fn move_node(
        &mut self,
        parent: NodeId,
        handle: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), DocumentError> {
        self.document.insert_before(parent, handle, before)?;
        self.record(Mutation::MoveNode {
            handle,
            parent,
            before,
        });
        Ok(())
    }

    pub fn remove_node(&mut self, parent: NodeId, handle: NodeId) -> Result<(), DocumentError> {
        self.document.remove_node(parent, handle)?;
        self.record(Mutation::RemoveNode { handle, parent });
        Ok(())
    }

    pub fn invoke_ref(&mut self, handle: Option<NodeId>) {
        self.record(Mutation::InvokeRef { handle });
    }

    pub fn lifecycle(&mut self, hook: LifecycleHook, instance: InstanceId, component: &'static str) {
        self.record(Mutation::InvokeLifecycle {
            hook,
            instance,
            component,
        });
    }

    pub fn finish(self) -> MutationLog {
        self.log
    }
}
