//! Built-in pipelines
//!
//! The default code-generation pipeline, available without any pipeline
//! file on disk.

use crate::workflow::loader::Pipeline;
use crate::workflow::types::ProcessDefinition;

/// Name of the built-in pipeline
pub const CODE_GENERATION: &str = "code-generation";

/// Six-stage code generation pipeline: requirements through documentation,
/// with approval gates on the architecture and the final docs.
pub fn code_generation() -> Pipeline {
    Pipeline {
        name: CODE_GENERATION.to_string(),
        description: Some("Requirements to documented code, step by step".to_string()),
        processes: vec![
            ProcessDefinition::new(
                "requirements_analyzer",
                "Requirements Analyzer",
                "Analyze user requirements and break down into specifications",
            )
            .with_io(&["requirements"], &["specifications"])
            .with_system_prompt(
                "You are a requirements analyst. Break down user requirements into clear \
                 technical specifications with acceptance criteria.",
            ),
            ProcessDefinition::new(
                "architecture_designer",
                "Architecture Designer",
                "Design system architecture based on specifications",
            )
            .with_io(&["specifications"], &["architecture"])
            .with_system_prompt(
                "You are a software architect. Design scalable, maintainable system \
                 architecture. Output should include component diagram, data flow, and \
                 tech stack decisions.",
            )
            .require_approval(),
            ProcessDefinition::new(
                "code_generator",
                "Code Generator",
                "Generate production-ready code based on architecture",
            )
            .with_io(&["architecture"], &["code"])
            .with_model("gemini-2.0-flash-thinking-exp")
            .with_system_prompt(
                "You are an expert coder. Generate clean, well-documented, production-ready \
                 code following best practices. Include error handling and tests.",
            ),
            ProcessDefinition::new(
                "code_reviewer",
                "Code Reviewer",
                "Review generated code for quality, security, and best practices",
            )
            .with_io(&["code"], &["review_report"])
            .with_system_prompt(
                "You are a senior code reviewer. Analyze code for security vulnerabilities, \
                 performance issues, code quality, and best practice violations. Provide \
                 actionable feedback.",
            ),
            ProcessDefinition::new(
                "test_generator",
                "Test Generator",
                "Generate comprehensive test suite",
            )
            .with_io(&["code"], &["tests"])
            .with_system_prompt(
                "You are a test engineer. Generate comprehensive unit tests, integration \
                 tests, and edge case tests.",
            ),
            ProcessDefinition::new(
                "documentation_writer",
                "Documentation Writer",
                "Generate complete documentation",
            )
            .with_io(&["code", "architecture"], &["documentation"])
            .with_system_prompt(
                "You are a technical writer. Create comprehensive documentation including \
                 README, API docs, deployment guide, and usage examples.",
            )
            .require_approval(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_pipeline_is_valid() {
        let pipeline = code_generation();
        pipeline.validate().unwrap();
        assert_eq!(pipeline.processes.len(), 6);
        assert_eq!(pipeline.processes[0].id, "requirements_analyzer");
    }

    #[test]
    fn approval_gates_match_the_pipeline_design() {
        let pipeline = code_generation();
        let gated: Vec<&str> = pipeline
            .processes
            .iter()
            .filter(|p| p.requires_approval)
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(gated, vec!["architecture_designer", "documentation_writer"]);
    }
}
