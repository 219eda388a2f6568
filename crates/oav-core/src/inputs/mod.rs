//! Form input derivation: control inference for parameters, the closed value
//! model, request-body form flattening, and flat/nested value conversion.

pub mod body_form;
pub mod form_state;
pub mod spec;
pub mod value;

pub use body_form::{BodyFormResolution, RequestBodyFormInput, ROOT_BODY_PATH, resolve_body_form_inputs};
pub use form_state::{
    HydrationResult, PathSegment, RequestBodyFormValueMap, build_initial_values,
    build_payload_from_values, hydrate_values_from_payload, parse_value_path,
};
pub use spec::{
    ArrayItemKind, ArrayStyle, ControlKind, ParamOption, ResolvedParameterInputSpec,
    SerializationHint, ValueKind, resolve_parameter_input_spec,
};
pub use value::{
    ParamValue, ScalarValue, is_value_empty, param_value_to_json, resolve_initial_value,
    serialize_value,
};
