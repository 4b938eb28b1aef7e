//! UI-agnostic field descriptors.
//!
//! A rendering layer walks a `Vec<FieldDescriptor>` and shows one widget per
//! descriptor. Editable descriptors carry a [`FieldHandle`] locating the
//! external [`FormField`] they write into, so a descriptor never borrows the
//! response it was built from.

use crate::model::{Form, FormField, RemediationStep, StepType};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Inline message set on an empty required field.
pub const REQUIRED_FIELD_MESSAGE: &str = "Field is required.";

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSegment {
    /// Index into the current form's fields.
    Field(usize),
    /// Index into the current field's options.
    Option(usize),
}

/// Location of a field inside a step's form.
///
/// The first segment indexes the step's root form. A `Field` segment after
/// another segment indexes the nested form of the field (or option) reached
/// so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn field(&self, index: usize) -> Self {
        self.child(PathSegment::Field(index))
    }

    pub fn option(&self, index: usize) -> Self {
        self.child(PathSegment::Option(index))
    }

    fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn resolve<'a>(&self, form: &'a Form) -> Option<&'a FormField> {
        let (first, rest) = self.0.split_first()?;
        let PathSegment::Field(index) = *first else {
            return None;
        };
        let mut field = form.fields.get(index)?;
        for segment in rest {
            field = match *segment {
                PathSegment::Field(i) => field.form.as_ref()?.fields.get(i)?,
                PathSegment::Option(i) => field.options.as_ref()?.get(i)?,
            };
        }
        Some(field)
    }

    pub fn resolve_mut<'a>(&self, form: &'a mut Form) -> Option<&'a mut FormField> {
        let (first, rest) = self.0.split_first()?;
        let PathSegment::Field(index) = *first else {
            return None;
        };
        let mut field = form.fields.get_mut(index)?;
        for segment in rest {
            field = match *segment {
                PathSegment::Field(i) => field.form.as_mut()?.fields.get_mut(i)?,
                PathSegment::Option(i) => field.options.as_mut()?.get_mut(i)?,
            };
        }
        Some(field)
    }
}

/// Handle to an external field: which step of the response, and where in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldHandle {
    pub step: usize,
    pub path: FieldPath,
}

impl FieldHandle {
    pub fn new(step: usize, path: FieldPath) -> Self {
        Self { step, path }
    }

    pub fn resolve<'a>(&self, step: &'a RemediationStep) -> Option<&'a FormField> {
        self.path.resolve(&step.form)
    }

    pub fn resolve_mut<'a>(&self, step: &'a mut RemediationStep) -> Option<&'a mut FormField> {
        self.path.resolve_mut(&mut step.form)
    }
}

/// Errors raised when a descriptor writes into its step.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Field handle does not resolve: step {step}, path {path:?}")]
    UnresolvedField { step: usize, path: FieldPath },

    #[error("Option {index} out of range ({len} options)")]
    NoSuchOption { index: usize, len: usize },
}

impl DescriptorError {
    fn unresolved(handle: &FieldHandle) -> Self {
        DescriptorError::UnresolvedField {
            step: handle.step,
            path: handle.path.clone(),
        }
    }
}

/// Free-text input bound to a string field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextField {
    pub handle: FieldHandle,
    pub label: String,
    pub required: bool,
    /// Obscure input (passwords, codes).
    pub secure: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
}

impl TextField {
    /// Store `value` here and in the external field.
    pub fn set_value(
        &mut self,
        value: impl Into<String>,
        step: &mut RemediationStep,
    ) -> Result<(), DescriptorError> {
        let value = value.into();
        let field = self
            .handle
            .resolve_mut(step)
            .ok_or_else(|| DescriptorError::unresolved(&self.handle))?;
        field.set_string_value(value.clone());
        self.value = value;
        Ok(())
    }

    /// Required-field check. Sets or clears `error_message`.
    pub fn validate(&mut self) -> bool {
        if self.required && self.value.is_empty() {
            self.error_message = Some(REQUIRED_FIELD_MESSAGE.to_string());
            false
        } else {
            self.error_message = None;
            true
        }
    }
}

/// One choice of an [`OptionGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionItem {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDescriptor>,
}

/// Single-choice group; each option may nest further fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionGroup {
    pub handle: FieldHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub options: Vec<OptionItem>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<usize>,
}

impl OptionGroup {
    /// Record the selection (or clear it) on the external field.
    pub fn select(
        &mut self,
        option: Option<usize>,
        step: &mut RemediationStep,
    ) -> Result<(), DescriptorError> {
        if let Some(index) = option {
            if index >= self.options.len() {
                return Err(DescriptorError::NoSuchOption {
                    index,
                    len: self.options.len(),
                });
            }
        }
        let field = self
            .handle
            .resolve_mut(step)
            .ok_or_else(|| DescriptorError::unresolved(&self.handle))?;
        field.selected_option = option;
        self.selected = option;
        Ok(())
    }

    /// Nested fields of the selected option.
    pub fn visible_fields(&self) -> &[FieldDescriptor] {
        self.selected
            .and_then(|index| self.options.get(index))
            .map(|option| option.fields.as_slice())
            .unwrap_or_default()
    }

    pub fn visible_fields_mut(&mut self) -> &mut [FieldDescriptor] {
        match self.selected.and_then(|index| self.options.get_mut(index)) {
            Some(option) => option.fields.as_mut_slice(),
            None => &mut [],
        }
    }
}

/// Step the action proceeds with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ActionTarget {
    /// Index into the response's remediations.
    pub step: usize,
    pub step_type: StepType,
}

/// Button that proceeds with a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionField {
    pub label: String,
    pub target: ActionTarget,
}

/// TOTP enrollment QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageField {
    pub label: String,
    #[serde(serialize_with = "serialize_base64")]
    pub image_bytes: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

/// A renderable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldDescriptor {
    Text(TextField),
    Options(OptionGroup),
    Action(ActionField),
    Image(ImageField),
}

impl FieldDescriptor {
    /// Display label; empty for unlabeled option groups.
    pub fn label(&self) -> &str {
        match self {
            FieldDescriptor::Text(text) => &text.label,
            FieldDescriptor::Options(group) => group.label.as_deref().unwrap_or_default(),
            FieldDescriptor::Action(action) => &action.label,
            FieldDescriptor::Image(image) => &image.label,
        }
    }

    /// Mutation handle of editable descriptors.
    pub fn handle(&self) -> Option<&FieldHandle> {
        match self {
            FieldDescriptor::Text(text) => Some(&text.handle),
            FieldDescriptor::Options(group) => Some(&group.handle),
            FieldDescriptor::Action(_) | FieldDescriptor::Image(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextField> {
        match self {
            FieldDescriptor::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_options(&self) -> Option<&OptionGroup> {
        match self {
            FieldDescriptor::Options(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_action(&self) -> Option<&ActionField> {
        match self {
            FieldDescriptor::Action(action) => Some(action),
            _ => None,
        }
    }

    /// Run required-field validation on this descriptor and, for option
    /// groups, on the selected option's fields. Every field is visited even
    /// after a failure so all messages are set.
    pub fn validate(&mut self) -> bool {
        match self {
            FieldDescriptor::Text(text) => text.validate(),
            FieldDescriptor::Options(group) => validate_all(group.visible_fields_mut()),
            FieldDescriptor::Action(_) | FieldDescriptor::Image(_) => true,
        }
    }
}

/// Validate a descriptor sequence, visiting every element.
pub fn validate_all(fields: &mut [FieldDescriptor]) -> bool {
    fields
        .iter_mut()
        .fold(true, |valid, field| field.validate() && valid)
}

/// Depth-first search for the descriptor owning `handle`, including inside
/// every option of a group.
pub fn find_by_handle_mut<'a>(
    fields: &'a mut [FieldDescriptor],
    handle: &FieldHandle,
) -> Option<&'a mut FieldDescriptor> {
    for field in fields.iter_mut() {
        if field.handle() == Some(handle) {
            return Some(field);
        }
        if let FieldDescriptor::Options(group) = field {
            for option in group.options.iter_mut() {
                if let Some(found) = find_by_handle_mut(&mut option.fields, handle) {
                    return Some(found);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_with_options() -> RemediationStep {
        let mut email = FormField::text("authenticator", "Email");
        email.form = Some(Form::new(vec![FormField::text("id", "Id")]));
        let mut phone = FormField::text("authenticator", "Phone");
        phone.form = Some(Form::new(vec![
            FormField::text("id", "Id"),
            FormField::text("methodType", "Method"),
        ]));
        let mut group = FormField::text("authenticator", "Authenticator");
        group.options = Some(vec![email, phone]);
        RemediationStep::new(StepType::SelectAuthenticatorEnroll, vec![group])
    }

    #[test]
    fn path_resolves_through_options() {
        let step = step_with_options();
        let path = FieldPath::root().field(0).option(1).field(1);
        assert_eq!(path.resolve(&step.form).unwrap().name, "methodType");
        assert!(FieldPath::root().resolve(&step.form).is_none());
        assert!(FieldPath::root().option(0).resolve(&step.form).is_none());
        assert!(FieldPath::root().field(0).option(5).resolve(&step.form).is_none());
    }

    #[test]
    fn text_set_value_writes_through() {
        let mut step = RemediationStep::new(
            StepType::Identify,
            vec![FormField::text("identifier", "Username")],
        );
        let mut text = TextField {
            handle: FieldHandle::new(0, FieldPath::root().field(0)),
            label: "Username".to_string(),
            required: true,
            secure: false,
            error_message: None,
            value: String::new(),
        };

        text.set_value("alice", &mut step).unwrap();

        assert_eq!(text.value, "alice");
        assert_eq!(step.field("identifier").unwrap().string_value(), Some("alice"));
    }

    #[test]
    fn text_set_value_reports_stale_handle() {
        let mut step = RemediationStep::new(StepType::Identify, Vec::new());
        let mut text = TextField {
            handle: FieldHandle::new(0, FieldPath::root().field(3)),
            label: String::new(),
            required: false,
            secure: false,
            error_message: None,
            value: String::new(),
        };
        let err = text.set_value("x", &mut step).unwrap_err();
        assert!(matches!(err, DescriptorError::UnresolvedField { step: 0, .. }));
        assert!(text.value.is_empty());
    }

    #[test]
    fn validate_sets_and_clears_required_message() {
        let mut text = TextField {
            handle: FieldHandle::new(0, FieldPath::root().field(0)),
            label: "Code".to_string(),
            required: true,
            secure: true,
            error_message: None,
            value: String::new(),
        };
        assert!(!text.validate());
        assert_eq!(text.error_message.as_deref(), Some(REQUIRED_FIELD_MESSAGE));

        text.value = "123456".to_string();
        assert!(text.validate());
        assert!(text.error_message.is_none());
    }

    #[test]
    fn select_records_index_and_rejects_out_of_range() {
        let mut step = step_with_options();
        let mut group = OptionGroup {
            handle: FieldHandle::new(0, FieldPath::root().field(0)),
            label: Some("Authenticator".to_string()),
            options: vec![
                OptionItem { index: 0, label: None, fields: Vec::new() },
                OptionItem { index: 1, label: None, fields: Vec::new() },
            ],
            required: false,
            error_message: None,
            selected: None,
        };

        group.select(Some(1), &mut step).unwrap();
        assert_eq!(step.form.fields[0].selected_option, Some(1));
        assert_eq!(group.selected, Some(1));

        let err = group.select(Some(2), &mut step).unwrap_err();
        assert_eq!(err, DescriptorError::NoSuchOption { index: 2, len: 2 });
        assert_eq!(step.form.fields[0].selected_option, Some(1));

        group.select(None, &mut step).unwrap();
        assert_eq!(step.form.fields[0].selected_option, None);
        assert!(group.visible_fields().is_empty());
    }

    #[test]
    fn option_group_validation_only_checks_selected_option() {
        let required_text = |path: FieldPath| {
            FieldDescriptor::Text(TextField {
                handle: FieldHandle::new(0, path),
                label: "Phone".to_string(),
                required: true,
                secure: false,
                error_message: None,
                value: String::new(),
            })
        };
        let base = FieldPath::root().field(0);
        let mut descriptor = FieldDescriptor::Options(OptionGroup {
            handle: FieldHandle::new(0, base.clone()),
            label: None,
            options: vec![
                OptionItem { index: 0, label: None, fields: Vec::new() },
                OptionItem {
                    index: 1,
                    label: None,
                    fields: vec![required_text(base.option(1).field(0))],
                },
            ],
            required: true,
            error_message: None,
            selected: Some(0),
        });
        assert!(descriptor.validate());

        if let FieldDescriptor::Options(group) = &mut descriptor {
            group.selected = Some(1);
        }
        assert!(!descriptor.validate());
        let nested = &descriptor.as_options().unwrap().visible_fields()[0];
        assert_eq!(
            nested.as_text().unwrap().error_message.as_deref(),
            Some(REQUIRED_FIELD_MESSAGE)
        );
    }

    #[test]
    fn find_by_handle_descends_into_options() {
        let base = FieldPath::root().field(0);
        let nested_handle = FieldHandle::new(0, base.option(0).field(0));
        let mut fields = vec![FieldDescriptor::Options(OptionGroup {
            handle: FieldHandle::new(0, base.clone()),
            label: None,
            options: vec![OptionItem {
                index: 0,
                label: None,
                fields: vec![FieldDescriptor::Text(TextField {
                    handle: nested_handle.clone(),
                    label: "Id".to_string(),
                    required: false,
                    secure: false,
                    error_message: None,
                    value: String::new(),
                })],
            }],
            required: false,
            error_message: None,
            selected: None,
        })];

        let found = find_by_handle_mut(&mut fields, &nested_handle).unwrap();
        assert_eq!(found.label(), "Id");
        let missing = FieldHandle::new(1, base);
        assert!(find_by_handle_mut(&mut fields, &missing).is_none());
    }

    #[test]
    fn image_serializes_as_base64() {
        let descriptor = FieldDescriptor::Image(ImageField {
            label: "Scan".to_string(),
            image_bytes: vec![0x89, b'P', b'N', b'G'],
            shared_secret: None,
        });
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["kind"], "image");
        assert_eq!(json["image_bytes"], "iVBORw==");
    }
}
