//! Configuration and test-generation handlers for testgen.

pub mod cases;
pub mod config;
pub mod curl;
pub mod generator;
pub mod java;
pub mod openapi;
pub mod output;
pub mod postprocess;

pub use cases::{CaseError, TestCase, load_test_cases};
pub use config::Config;
pub use curl::{CurlError, CurlRequest};
pub use generator::{GeneratedTest, GeneratorSettings, MethodSpec, TestGenerator};
pub use java::{JavaFileReport, JavaSourceInfo, analyze_java_sources};
pub use openapi::{Endpoint, OpenApiDocument, OpenApiError, TestPlan};
pub use output::{java_file_path, save_generated_test};
pub use postprocess::{ensure_doc_tags, strip_code_fences};
