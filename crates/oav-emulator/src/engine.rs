//! The request emulator: per-operation session state, explicit
//! recompute-on-write request preparation, body editor sync, and live
//! execution.
//!
//! All mutable state lives on the `RequestEmulator` instance. Every mutator
//! finishes by rebuilding the prepared request, so reads never observe a
//! stale snapshot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use oav_core::document::operation::{HttpMethod, Operation};
use oav_core::document::parameter::{Parameter, ParameterLocation};
use oav_core::document::schema::Schema;
use oav_core::document::spec::OpenApiDocument;
use oav_core::example::generate_example;
use oav_core::inputs::{
    ArrayStyle, ParamValue, RequestBodyFormInput, RequestBodyFormValueMap,
    ResolvedParameterInputSpec, build_initial_values, build_payload_from_values,
    hydrate_values_from_payload, resolve_body_form_inputs, resolve_initial_value,
    resolve_parameter_input_spec, serialize_value,
};
use oav_core::navigation::find_operation;
use oav_core::security::resolve_request_authorization;

use crate::prepare::{
    build_cookie_header, build_curl_command, build_request_url, interpolate_path_params,
    serialize_query_params,
};
use crate::response::{
    ExecutionError, ExecutionErrorCode, ExecutionState, ResponseResult, classify_response_body,
};
use crate::store::CredentialStore;

/// Engine configuration, fixed for the lifetime of the instance.
#[derive(Debug, Clone, Default)]
pub struct EmulatorOptions {
    /// Prefix for relative endpoint paths. Absolute endpoint paths bypass
    /// it.
    pub base_api_url: String,
    /// Per-request send timeout; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyEditorMode {
    #[default]
    Json,
    Form,
}

/// The operation the session currently emulates.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSelection {
    pub operation_id: String,
    pub path: String,
    pub method: HttpMethod,
}

/// One editable parameter with its derived control and live value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInput {
    /// `location:name`, unique within an operation.
    pub key: String,
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub description: String,
    pub spec: ResolvedParameterInputSpec,
    pub value: ParamValue,
}

/// Parameter inputs split by location, in declaration order.
#[derive(Debug, Default)]
pub struct GroupedInputs<'a> {
    pub path: Vec<&'a ParamInput>,
    pub query: Vec<&'a ParamInput>,
    pub header: Vec<&'a ParamInput>,
    pub cookie: Vec<&'a ParamInput>,
}

/// A fully assembled request snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: IndexMap<String, String>,
    pub body_text: Option<String>,
    pub curl: String,
    /// Path parameters still carrying their `{name}` placeholder.
    pub missing_path_params: Vec<String>,
}

pub struct RequestEmulator {
    document: Arc<OpenApiDocument>,
    options: EmulatorOptions,
    client: reqwest::Client,
    store: Option<CredentialStore>,
    credentials: IndexMap<String, String>,

    selection: Option<EndpointSelection>,
    operation: Option<Operation>,
    path_item_parameters: Vec<Parameter>,
    param_inputs: Vec<ParamInput>,

    body_content_type: Option<String>,
    body_schema: Option<Schema>,
    body_required: bool,
    body_editor_mode: BodyEditorMode,
    body_text: String,
    body_json_warning: Option<String>,
    body_form_inputs: Vec<RequestBodyFormInput>,
    body_form_values: RequestBodyFormValueMap,
    body_form_warnings: Vec<String>,

    emitted_warnings: IndexSet<String>,
    prepared: Option<PreparedRequest>,
    execution: ExecutionState,
}

impl RequestEmulator {
    pub fn new(document: Arc<OpenApiDocument>, options: EmulatorOptions) -> Self {
        Self {
            document,
            options,
            client: reqwest::Client::new(),
            store: None,
            credentials: IndexMap::new(),
            selection: None,
            operation: None,
            path_item_parameters: Vec::new(),
            param_inputs: Vec::new(),
            body_content_type: None,
            body_schema: None,
            body_required: false,
            body_editor_mode: BodyEditorMode::default(),
            body_text: String::new(),
            body_json_warning: None,
            body_form_inputs: Vec::new(),
            body_form_values: RequestBodyFormValueMap::new(),
            body_form_warnings: Vec::new(),
            emitted_warnings: IndexSet::new(),
            prepared: None,
            execution: ExecutionState::default(),
        }
    }

    /// Attach a persistence backend and seed credentials for every scheme
    /// the document defines.
    pub fn attach_store(&mut self, store: CredentialStore) {
        let persisted = store.load();
        let components = self.document.components_or_default();
        for key in components.security_schemes.keys() {
            if self.credentials.contains_key(key) {
                continue;
            }
            if let Some(value) = persisted.get(key) {
                self.credentials.insert(key.clone(), value.clone());
            }
        }
        self.store = Some(store);
        self.recompute_prepared();
    }

    // --- selection -------------------------------------------------------

    /// Switch the session to an operation by id, reinitializing all
    /// per-operation state. Returns `false` when the id is unknown.
    pub fn select_operation(&mut self, operation_id: &str) -> bool {
        let document = Arc::clone(&self.document);
        let Some((path, method, operation)) = find_operation(&document, operation_id) else {
            log::warn!("operation \"{operation_id}\" not found in document");
            return false;
        };

        self.selection = Some(EndpointSelection {
            operation_id: operation_id.to_string(),
            path: path.to_string(),
            method,
        });
        self.operation = Some(operation.clone());
        self.path_item_parameters = document
            .paths
            .get(path)
            .map(|item| item.parameters.clone())
            .unwrap_or_default();

        self.initialize_request_state();
        self.recompute_prepared();
        true
    }

    /// Rebuild all per-operation state from the current selection.
    pub fn reset_request(&mut self) {
        self.initialize_request_state();
        self.recompute_prepared();
    }

    fn initialize_request_state(&mut self) {
        self.emitted_warnings.clear();
        self.body_editor_mode = BodyEditorMode::Json;
        self.body_json_warning = None;
        self.execution = ExecutionState::default();

        let Some(operation) = self.operation.clone() else {
            self.param_inputs = Vec::new();
            self.body_content_type = None;
            self.body_schema = None;
            self.body_required = false;
            self.body_text = String::new();
            self.body_form_inputs = Vec::new();
            self.body_form_values = RequestBodyFormValueMap::new();
            self.body_form_warnings = Vec::new();
            return;
        };

        // Operation parameters override path-item parameters sharing the
        // same name and location.
        let mut merged = self.path_item_parameters.clone();
        for param in operation.parameters.iter().cloned() {
            match merged
                .iter_mut()
                .find(|existing| existing.name == param.name && existing.location == param.location)
            {
                Some(slot) => *slot = param,
                None => merged.push(param),
            }
        }
        self.param_inputs = merged.iter().map(create_param_input).collect();

        let components = self.document.components_or_default();
        let (content_type, schema, example, required) = read_body_content(&operation);
        self.body_content_type = content_type;
        self.body_schema = schema;
        self.body_required = required;

        let base_example = example
            .unwrap_or_else(|| generate_example(self.body_schema.as_ref(), &components));
        self.body_text = stringify_unknown(&base_example);

        if self.is_json_body() {
            let resolution = resolve_body_form_inputs(self.body_schema.as_ref(), &components);
            self.body_form_values = build_initial_values(&resolution.inputs);
            self.body_form_inputs = resolution.inputs;
            for warning in &resolution.warnings {
                self.emit_warning_once(warning);
            }
            self.body_form_warnings = resolution.warnings;
            self.sync_form_from_json_text();
        } else {
            self.body_form_inputs = Vec::new();
            self.body_form_values = RequestBodyFormValueMap::new();
            self.body_form_warnings = Vec::new();
        }
    }

    // --- mutators --------------------------------------------------------

    /// Set a parameter value by its `location:name` key. Returns `false`
    /// for unknown keys.
    pub fn set_param_value(&mut self, key: &str, value: ParamValue) -> bool {
        let Some(input) = self.param_inputs.iter_mut().find(|input| input.key == key) else {
            log::warn!("unknown parameter key \"{key}\"");
            return false;
        };
        input.value = value;
        self.recompute_prepared();
        true
    }

    pub fn set_body_text(&mut self, text: impl Into<String>) {
        self.body_text = text.into();
        if self.body_editor_mode == BodyEditorMode::Json {
            self.sync_form_from_json_text();
        }
        self.recompute_prepared();
    }

    /// Set one body form value by path. Returns `false` for paths the form
    /// does not carry.
    pub fn set_form_value(&mut self, path: &str, value: ParamValue) -> bool {
        if !self.body_form_inputs.iter().any(|input| input.path == path) {
            log::warn!("unknown body form path \"{path}\"");
            return false;
        }
        self.body_form_values.insert(path.to_string(), value);
        if self.body_editor_mode == BodyEditorMode::Form {
            self.sync_json_text_from_form();
        }
        self.recompute_prepared();
        true
    }

    pub fn set_body_editor_mode(&mut self, mode: BodyEditorMode) {
        if self.body_editor_mode == mode {
            return;
        }
        self.body_editor_mode = mode;
        if mode == BodyEditorMode::Form {
            // Entering the form pulls the JSON text in, then normalizes the
            // text from whatever the form now holds.
            self.sync_form_from_json_text();
            self.sync_json_text_from_form();
        }
        self.recompute_prepared();
    }

    pub fn set_credential(&mut self, scheme_key: impl Into<String>, credential: impl Into<String>) {
        self.credentials.insert(scheme_key.into(), credential.into());
        if let Some(store) = &self.store {
            store.save(&self.credentials);
        }
        self.recompute_prepared();
    }

    // --- body editor sync ------------------------------------------------

    fn sync_form_from_json_text(&mut self) {
        if !self.is_json_body() || self.body_form_inputs.is_empty() {
            self.body_json_warning = None;
            return;
        }

        let raw = self.body_text.trim().to_string();
        if raw.is_empty() {
            self.body_json_warning = None;
            return;
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(parsed) => {
                let hydrated = hydrate_values_from_payload(
                    &self.body_form_inputs,
                    &parsed,
                    &self.body_form_values,
                );
                self.body_form_values = hydrated.values;
                self.body_form_warnings
                    .retain(|warning| !warning.contains("JSON payload is not an object"));
                for warning in hydrated.warnings {
                    self.emit_warning_once(&warning);
                    if !self.body_form_warnings.contains(&warning) {
                        self.body_form_warnings.push(warning);
                    }
                }
                self.body_json_warning = None;
            }
            Err(_) => {
                self.body_json_warning =
                    Some("Invalid JSON. Form values were kept unchanged.".to_string());
                self.emit_warning_once(
                    "failed to parse request body JSON while hydrating form values",
                );
            }
        }
    }

    fn sync_json_text_from_form(&mut self) {
        if !self.is_json_body() || self.body_form_inputs.is_empty() {
            return;
        }

        let payload = build_payload_from_values(&self.body_form_inputs, &self.body_form_values);
        self.body_text = match payload {
            None => String::new(),
            Some(payload) => serde_json::to_string_pretty(&payload).unwrap_or_default(),
        };
        self.body_json_warning = None;
    }

    /// The body text that actually goes on the wire.
    ///
    /// Form mode serializes the form payload (compact); JSON mode sends the
    /// trimmed editor text. `None` means no body.
    fn transport_body_text(&self) -> Option<String> {
        self.body_content_type.as_ref()?;

        if self.body_editor_mode == BodyEditorMode::Form
            && self.is_json_body()
            && !self.body_form_inputs.is_empty()
        {
            let payload = build_payload_from_values(&self.body_form_inputs, &self.body_form_values)?;
            if let Ok(serialized) = serde_json::to_string(&payload) {
                return Some(serialized);
            }
        }

        let raw = self.body_text.trim();
        (!raw.is_empty()).then(|| raw.to_string())
    }

    // --- preparation -----------------------------------------------------

    fn recompute_prepared(&mut self) {
        let Some(selection) = self.selection.clone() else {
            self.prepared = None;
            return;
        };

        let mut path_values: IndexMap<String, String> = IndexMap::new();
        let mut query_pairs: Vec<(String, Vec<String>)> = Vec::new();
        let mut headers: IndexMap<String, String> = IndexMap::new();
        let mut cookie_pairs: Vec<(String, String)> = Vec::new();

        for input in &self.param_inputs {
            let serialized = serialize_value(&input.spec, &input.value);
            match input.location {
                ParameterLocation::Path => {
                    path_values.insert(input.name.clone(), join_serialized(&serialized));
                }
                ParameterLocation::Query => {
                    if serialized.is_empty() {
                        continue;
                    }
                    if serialized.len() > 1 && input.spec.hint.array_style == ArrayStyle::Multi {
                        query_pairs.push((input.name.clone(), serialized));
                    } else {
                        query_pairs.push((input.name.clone(), vec![join_serialized(&serialized)]));
                    }
                }
                ParameterLocation::Header => {
                    let joined = join_serialized(&serialized);
                    if !joined.is_empty() {
                        headers.insert(input.name.clone(), joined);
                    }
                }
                ParameterLocation::Cookie => {
                    let joined = join_serialized(&serialized);
                    if !joined.is_empty() {
                        cookie_pairs.push((input.name.clone(), joined));
                    }
                }
            }
        }

        // Authorization merges last: its headers win, query and cookies
        // append.
        let components = self.document.components_or_default();
        let requirements = self
            .operation
            .as_ref()
            .and_then(|operation| operation.security.clone())
            .or_else(|| self.document.security.clone());
        let auth = resolve_request_authorization(
            requirements.as_deref(),
            &components.security_schemes,
            &self.credentials,
        );
        for warning in &auth.warnings {
            self.emit_warning_once(warning);
        }
        for (key, value) in auth.target.headers {
            headers.insert(key, value);
        }
        for (key, value) in auth.target.query {
            query_pairs.push((key, vec![value]));
        }
        for (key, value) in auth.target.cookies {
            cookie_pairs.push((key, value));
        }

        let interpolation = interpolate_path_params(&selection.path, &path_values);
        let query = serialize_query_params(&query_pairs);
        let url = build_request_url(&self.options.base_api_url, &interpolation.path, &query);

        if let Some(cookie) = build_cookie_header(&cookie_pairs) {
            headers.insert("Cookie".to_string(), cookie);
        }

        let body_text = self.transport_body_text();
        if body_text.is_some() {
            if let Some(content_type) = &self.body_content_type {
                headers.insert("Content-Type".to_string(), content_type.clone());
            }
        }

        let curl = build_curl_command(
            selection.method.as_str(),
            &url,
            &headers,
            body_text.as_deref(),
        );
        self.prepared = Some(PreparedRequest {
            url,
            method: selection.method,
            headers,
            body_text,
            curl,
            missing_path_params: interpolation.missing,
        });
    }

    // --- execution -------------------------------------------------------

    /// Send the prepared request.
    ///
    /// `&mut self` makes sends single-flight per instance; the outcome
    /// lands in [`ExecutionState`] and is also returned.
    pub async fn send_request(&mut self) -> &ExecutionState {
        let Some(prepared) = self.prepared.clone() else {
            log::warn!("request send skipped because no operation is selected");
            self.execution = ExecutionState {
                is_sending: false,
                result: None,
                error: Some(ExecutionError {
                    code: ExecutionErrorCode::InvalidRequest,
                    message: "Request is not ready yet.".to_string(),
                }),
            };
            return &self.execution;
        };

        self.execution = ExecutionState {
            is_sending: true,
            result: None,
            error: None,
        };

        let mut request = self
            .client
            .request(to_reqwest_method(prepared.method), &prepared.url);
        for (key, value) in &prepared.headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &prepared.body_text {
            request = request.body(body.clone());
        }
        if let Some(timeout) = self.options.request_timeout {
            request = request.timeout(timeout);
        }

        let started = Instant::now();
        self.execution = match request.send().await {
            Ok(response) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let status = response.status();
                let headers: IndexMap<String, String> = response
                    .headers()
                    .iter()
                    .map(|(key, value)| {
                        (
                            key.as_str().to_string(),
                            String::from_utf8_lossy(value.as_bytes()).into_owned(),
                        )
                    })
                    .collect();
                let content_type = headers.get("content-type").cloned();

                match response.text().await {
                    Ok(raw) => {
                        let (body, body_text, body_kind) =
                            classify_response_body(&raw, content_type.as_deref());
                        ExecutionState {
                            is_sending: false,
                            result: Some(ResponseResult {
                                status: status.as_u16(),
                                status_text: status
                                    .canonical_reason()
                                    .unwrap_or_default()
                                    .to_string(),
                                ok: status.is_success(),
                                elapsed_ms,
                                headers,
                                body,
                                body_text,
                                body_kind,
                            }),
                            error: None,
                        }
                    }
                    Err(error) => execution_failure(error),
                }
            }
            Err(error) => execution_failure(error),
        };

        &self.execution
    }

    // --- accessors -------------------------------------------------------

    pub fn document(&self) -> &OpenApiDocument {
        &self.document
    }

    pub fn selection(&self) -> Option<&EndpointSelection> {
        self.selection.as_ref()
    }

    pub fn prepared_request(&self) -> Option<&PreparedRequest> {
        self.prepared.as_ref()
    }

    pub fn execution(&self) -> &ExecutionState {
        &self.execution
    }

    pub fn param_inputs(&self) -> &[ParamInput] {
        &self.param_inputs
    }

    pub fn grouped_inputs(&self) -> GroupedInputs<'_> {
        let mut grouped = GroupedInputs::default();
        for input in &self.param_inputs {
            match input.location {
                ParameterLocation::Path => grouped.path.push(input),
                ParameterLocation::Query => grouped.query.push(input),
                ParameterLocation::Header => grouped.header.push(input),
                ParameterLocation::Cookie => grouped.cookie.push(input),
            }
        }
        grouped
    }

    pub fn credentials(&self) -> &IndexMap<String, String> {
        &self.credentials
    }

    pub fn has_request_body(&self) -> bool {
        self.body_content_type.is_some()
    }

    pub fn body_content_type(&self) -> Option<&str> {
        self.body_content_type.as_deref()
    }

    pub fn is_json_body(&self) -> bool {
        self.body_content_type
            .as_deref()
            .map(|content_type| content_type.to_lowercase().contains("json"))
            .unwrap_or(false)
    }

    pub fn body_editor_mode(&self) -> BodyEditorMode {
        self.body_editor_mode
    }

    pub fn body_text(&self) -> &str {
        &self.body_text
    }

    pub fn body_json_warning(&self) -> Option<&str> {
        self.body_json_warning.as_deref()
    }

    pub fn body_form_inputs(&self) -> &[RequestBodyFormInput] {
        &self.body_form_inputs
    }

    pub fn body_form_values(&self) -> &RequestBodyFormValueMap {
        &self.body_form_values
    }

    pub fn body_form_warnings(&self) -> &[String] {
        &self.body_form_warnings
    }

    /// Human-readable blockers for sending, currently unfilled required
    /// path parameters.
    pub fn validation_errors(&self) -> Vec<String> {
        let Some(prepared) = &self.prepared else {
            return vec!["No operation selected.".to_string()];
        };
        prepared
            .missing_path_params
            .iter()
            .map(|name| format!("Path parameter \"{name}\" has no value."))
            .collect()
    }

    fn emit_warning_once(&mut self, message: &str) {
        if self.emitted_warnings.insert(message.to_string()) {
            log::warn!("{message}");
        }
    }
}

fn create_param_input(param: &Parameter) -> ParamInput {
    let spec = resolve_parameter_input_spec(param, param.location);
    let seed = param
        .schema
        .as_ref()
        .and_then(|schema| schema.default_value.clone().or_else(|| schema.example.clone()));
    let value = resolve_initial_value(&spec, seed.as_ref());

    ParamInput {
        key: format!("{}:{}", param.location.as_str(), param.name),
        name: param.name.clone(),
        location: param.location,
        required: param.required,
        description: param.description.clone().unwrap_or_default(),
        spec,
        value,
    }
}

/// Content negotiation for the request body editor: JSON first, then the
/// form encodings, then whatever the document lists first.
fn read_body_content(operation: &Operation) -> (Option<String>, Option<Schema>, Option<Value>, bool) {
    let Some(body) = &operation.request_body else {
        return (None, None, None, false);
    };

    const PREFERRED: [&str; 3] = [
        "application/json",
        "multipart/form-data",
        "application/x-www-form-urlencoded",
    ];
    let entry = PREFERRED
        .iter()
        .find_map(|key| body.content.get_key_value(*key))
        .or_else(|| body.content.first());

    match entry {
        Some((content_type, media)) => {
            let example = media.example.clone().or_else(|| {
                media
                    .schema
                    .as_ref()
                    .and_then(|schema| schema.example.clone())
            });
            (
                Some(content_type.clone()),
                media.schema.clone(),
                example,
                body.required,
            )
        }
        None => (None, None, None, body.required),
    }
}

fn join_serialized(serialized: &[String]) -> String {
    match serialized {
        [] => String::new(),
        [single] => single.clone(),
        many => many.join(","),
    }
}

fn stringify_unknown(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn execution_failure(error: reqwest::Error) -> ExecutionState {
    let (code, message) = if error.is_timeout() {
        (ExecutionErrorCode::NetworkError, "Request timed out.".to_string())
    } else if error.is_connect() {
        (ExecutionErrorCode::NetworkError, error.to_string())
    } else {
        (ExecutionErrorCode::UnexpectedError, error.to_string())
    };

    match code {
        ExecutionErrorCode::NetworkError => {
            log::warn!("request failed with network/timeout issue: {error}");
        }
        _ => log::error!("unexpected request execution failure: {error}"),
    }

    ExecutionState {
        is_sending: false,
        result: None,
        error: Some(ExecutionError { code, message }),
    }
}
