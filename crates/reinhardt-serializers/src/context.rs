//! Per-call traversal state.
//!
//! Fields carry no mutable state of their own. Everything a field needs to
//! know about the traversal it takes part in (the owning object, the nesting
//! budget, the ancestors being converted, per-call flags) travels in these
//! contexts, which are cloned on the way down and never shared across calls.

use std::sync::Arc;

use crate::model::{FieldDescriptor, ModelRegistry, ModelType};
use crate::options::Nested;
use crate::settings::Settings;
use crate::value::{ObjectRef, identity};

#[derive(Debug)]
struct ConvertRoot {
	use_natural_keys: bool,
	settings: Arc<Settings>,
}

/// State for one object-to-primitive traversal.
#[derive(Debug, Clone)]
pub struct ConvertContext {
	root: Arc<ConvertRoot>,
	stack: Vec<usize>,
	nested: Nested,
	owner: Option<(ObjectRef, String)>,
	descriptor: Option<FieldDescriptor>,
}

impl ConvertContext {
	pub fn new(use_natural_keys: bool, settings: Arc<Settings>) -> Self {
		Self {
			root: Arc::new(ConvertRoot {
				use_natural_keys,
				settings,
			}),
			stack: Vec::new(),
			nested: Nested::Flat,
			owner: None,
			descriptor: None,
		}
	}

	/// Whether the top-level call asked for natural keys.
	pub fn use_natural_keys(&self) -> bool {
		self.root.use_natural_keys
	}

	pub fn settings(&self) -> &Settings {
		&self.root.settings
	}

	/// Remaining nesting budget.
	pub fn nested(&self) -> Nested {
		self.nested
	}

	/// The object and field name currently being converted, if any.
	pub fn owner(&self) -> Option<(&ObjectRef, &str)> {
		self.owner.as_ref().map(|(obj, name)| (obj, name.as_str()))
	}

	/// Model field bound to the current field name.
	pub fn descriptor(&self) -> Option<&FieldDescriptor> {
		self.descriptor.as_ref()
	}

	/// True when `obj` is an ancestor in the current traversal.
	pub fn contains(&self, obj: &ObjectRef) -> bool {
		self.stack.contains(&identity(obj))
	}

	pub(crate) fn with_nested(mut self, nested: Nested) -> Self {
		self.nested = nested;
		self
	}

	pub(crate) fn with_owner(mut self, obj: &ObjectRef, name: &str) -> Self {
		self.owner = Some((obj.clone(), name.to_string()));
		self
	}

	pub(crate) fn with_descriptor(mut self, descriptor: Option<FieldDescriptor>) -> Self {
		self.descriptor = descriptor;
		self
	}

	pub(crate) fn push(mut self, obj: &ObjectRef) -> Self {
		self.stack.push(identity(obj));
		self
	}
}

#[derive(Debug)]
struct RevertRoot {
	settings: Arc<Settings>,
	registry: Arc<ModelRegistry>,
	collect_errors: bool,
}

/// State for one primitive-to-object traversal.
#[derive(Debug, Clone)]
pub struct RevertContext {
	root: Arc<RevertRoot>,
	nested: Nested,
	parent_class: Option<Arc<dyn ModelType>>,
	descriptor: Option<FieldDescriptor>,
	instance: Option<ObjectRef>,
}

impl RevertContext {
	pub fn new(settings: Arc<Settings>, registry: Arc<ModelRegistry>) -> Self {
		Self {
			root: Arc::new(RevertRoot {
				settings,
				registry,
				collect_errors: false,
			}),
			nested: Nested::Flat,
			parent_class: None,
			descriptor: None,
			instance: None,
		}
	}

	pub(crate) fn with_collect_errors(self, collect_errors: bool) -> Self {
		Self {
			root: Arc::new(RevertRoot {
				settings: self.root.settings.clone(),
				registry: self.root.registry.clone(),
				collect_errors,
			}),
			..self
		}
	}

	pub fn settings(&self) -> &Settings {
		&self.root.settings
	}

	pub fn registry(&self) -> &Arc<ModelRegistry> {
		&self.root.registry
	}

	pub fn collect_errors(&self) -> bool {
		self.root.collect_errors
	}

	pub fn nested(&self) -> Nested {
		self.nested
	}

	/// Model type resolved by the enclosing serializer.
	pub fn parent_class(&self) -> Option<&Arc<dyn ModelType>> {
		self.parent_class.as_ref()
	}

	/// Model field bound to the current field name.
	pub fn descriptor(&self) -> Option<&FieldDescriptor> {
		self.descriptor.as_ref()
	}

	/// Object to update in place. Only the top level sees it.
	pub fn instance(&self) -> Option<&ObjectRef> {
		self.instance.as_ref()
	}

	pub(crate) fn with_nested(mut self, nested: Nested) -> Self {
		self.nested = nested;
		self
	}

	pub(crate) fn with_parent_class(mut self, class: Option<Arc<dyn ModelType>>) -> Self {
		self.parent_class = class;
		self
	}

	pub(crate) fn with_descriptor(mut self, descriptor: Option<FieldDescriptor>) -> Self {
		self.descriptor = descriptor;
		self
	}

	pub(crate) fn with_instance(mut self, instance: Option<ObjectRef>) -> Self {
		self.instance = instance;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::object::PlainObject;
	use rstest::rstest;

	#[rstest]
	fn test_stack_tracks_ancestors_only() {
		let a: ObjectRef = Arc::new(PlainObject::new("Node"));
		let b: ObjectRef = Arc::new(PlainObject::new("Node"));
		let ctx = ConvertContext::new(false, Arc::new(Settings::default()));

		let child = ctx.clone().push(&a);
		assert!(child.contains(&a));
		assert!(!child.contains(&b));
		assert!(!ctx.contains(&a));
	}

	#[rstest]
	fn test_flags_are_shared_with_children() {
		let ctx = ConvertContext::new(true, Arc::new(Settings::default()))
			.with_nested(Nested::Depth(2));
		let child = ctx.clone().with_nested(ctx.nested().descend());
		assert!(child.use_natural_keys());
		assert_eq!(child.nested(), Nested::Depth(1));
	}

	#[rstest]
	fn test_collect_errors_toggle() {
		let ctx = RevertContext::new(Arc::new(Settings::default()), ModelRegistry::global());
		assert!(!ctx.collect_errors());
		assert!(ctx.with_collect_errors(true).collect_errors());
	}
}
