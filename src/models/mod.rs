pub mod domain;
pub mod dto;
pub mod llm_output;
