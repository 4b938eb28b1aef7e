//! Maps remediation steps into field descriptors.

use crate::fields::{
    ActionField, ActionTarget, FieldDescriptor, FieldHandle, FieldPath, ImageField, OptionGroup,
    OptionItem, TextField,
};
use crate::model::{Form, FormField, RemediationStep, Response, StepType, STRING_FIELD_TYPE};
use tracing::{debug, trace};

/// Label of the TOTP image when the authenticator has no display name.
pub const DEFAULT_TOTP_LABEL: &str =
    "Launch Google Authenticator, tap the \"+\" icon, then select \"Scan a QR code\".";

/// Button label for a step type.
pub fn action_label(step_type: StepType) -> &'static str {
    match step_type {
        StepType::Skip => "Skip",
        StepType::SelectAuthenticatorAuthenticate | StepType::SelectAuthenticatorEnroll => {
            "Choose Authenticator"
        }
        StepType::LaunchAuthenticator => "Launch Authenticator",
        StepType::Cancel => "Restart",
        StepType::UnlockAccount => "Unlock Account",
        _ => "Continue",
    }
}

/// Stateless mapper from the external step model to descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemediationMapper;

impl RemediationMapper {
    pub fn new() -> Self {
        Self
    }

    /// Map one field located at `path` inside step `step`.
    ///
    /// A nested form flattens into the returned sequence, an option list
    /// becomes one group, a string becomes one text input. Other field types
    /// produce nothing.
    pub fn map_field(&self, step: usize, field: &FormField, path: &FieldPath) -> Vec<FieldDescriptor> {
        if let Some(form) = field.form.as_ref().filter(|form| form.has_visible_fields()) {
            return self.map_form(step, form, path);
        }

        let options = field.option_list();
        if !options.is_empty() {
            let items = options
                .iter()
                .enumerate()
                .map(|(index, option)| {
                    let option_path = path.option(index);
                    let fields = option
                        .form
                        .as_ref()
                        .map(|form| self.map_form(step, form, &option_path))
                        .unwrap_or_default();
                    OptionItem {
                        index,
                        label: option.label.clone(),
                        fields,
                    }
                })
                .collect();
            return vec![FieldDescriptor::Options(OptionGroup {
                handle: FieldHandle::new(step, path.clone()),
                label: field.label.clone(),
                options: items,
                required: field.required,
                error_message: field.display_messages(),
                selected: field.selected_option,
            })];
        }

        if field.field_type == STRING_FIELD_TYPE {
            return vec![FieldDescriptor::Text(TextField {
                handle: FieldHandle::new(step, path.clone()),
                label: field.label.clone().unwrap_or_default(),
                required: field.required,
                secure: field.secret,
                error_message: field.display_messages(),
                value: field.string_value().unwrap_or_default().to_string(),
            })];
        }

        trace!(
            field = %field.name,
            field_type = %field.field_type,
            "Dropping field of unsupported type"
        );
        Vec::new()
    }

    /// Map the visible fields of `form`, whose fields are children of `base`.
    pub fn map_form(&self, step: usize, form: &Form, base: &FieldPath) -> Vec<FieldDescriptor> {
        form.visible_fields()
            .flat_map(|(index, field)| self.map_field(step, field, &base.field(index)))
            .collect()
    }

    /// TOTP image of the step, when an authenticator carries a decodable one.
    pub fn totp_image(&self, step: &RemediationStep) -> Option<ImageField> {
        let (authenticator, totp) = step.totp_authenticator()?;
        let Some(image_bytes) = totp.image_bytes() else {
            debug!(authenticator = %authenticator.id, "TOTP image did not decode");
            return None;
        };
        Some(ImageField {
            label: authenticator
                .display_name
                .clone()
                .unwrap_or_else(|| DEFAULT_TOTP_LABEL.to_string()),
            image_bytes,
            shared_secret: totp.shared_secret.clone(),
        })
    }

    /// The proceed button for a step. Polled steps without input get none.
    pub fn step_action(&self, step_index: usize, step: &RemediationStep) -> Option<ActionField> {
        if !step.form.has_visible_fields() && step.is_pollable() {
            return None;
        }
        Some(ActionField {
            label: action_label(step.step_type).to_string(),
            target: ActionTarget {
                step: step_index,
                step_type: step.step_type,
            },
        })
    }

    /// Full descriptor sequence for `response.remediations[step_index]`:
    /// TOTP image, visible fields, action, then the skip action when asked
    /// for and offered.
    pub fn map_step(
        &self,
        response: &Response,
        step_index: usize,
        include_skip: bool,
    ) -> Vec<FieldDescriptor> {
        let Some(step) = response.remediations.get(step_index) else {
            debug!(step_index, "No remediation at index");
            return Vec::new();
        };

        let mut fields = Vec::new();
        if let Some(image) = self.totp_image(step) {
            fields.push(FieldDescriptor::Image(image));
        }
        fields.extend(self.map_form(step_index, &step.form, &FieldPath::root()));
        if let Some(action) = self.step_action(step_index, step) {
            fields.push(FieldDescriptor::Action(action));
        }
        if include_skip {
            let skip = response
                .remediation_index(StepType::Skip)
                .filter(|&index| index != step_index);
            if let Some(index) = skip {
                let skip_step = &response.remediations[index];
                if let Some(action) = self.step_action(index, skip_step) {
                    fields.push(FieldDescriptor::Action(action));
                }
            }
        }

        debug!(
            step = %step.step_type,
            count = fields.len(),
            include_skip,
            "Mapped remediation"
        );
        fields
    }
}
