//! Instruction text sent to the model.
//!
//! Builds a persona instruction plus a user instruction that enumerates the
//! sanitized request fields and pins the five-key JSON output contract. This
//! module is pure: the same [`RequestPayload`] always yields byte-identical
//! text.

use crate::payload::RequestPayload;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The two instruction strings handed to the model gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    /// Persona and alignment rules (sent as the system instruction).
    pub system_instruction: String,
    /// Task, field values and output contract (sent as user content).
    pub user_instruction: String,
}

impl ComposedPrompt {
    /// Both parts joined, as printed by `lessonplan prompt`.
    pub fn to_text(&self) -> String {
        format!("{}\n\n{}", self.system_instruction, self.user_instruction)
    }
}

// ---------------------------------------------------------------------------
// Sanitization
// ---------------------------------------------------------------------------

/// Characters that could break the JSON contract embedded in the
/// instruction text or open a template-style injection.
const STRIPPED_CHARS: [char; 3] = ['{', '}', '$'];

/// Remove `{`, `}` and `$` from caller-supplied text.
pub fn sanitize(input: &str) -> String {
    input.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect()
}

// ---------------------------------------------------------------------------
// Prompt construction
// ---------------------------------------------------------------------------

const SYSTEM_INSTRUCTION: &str = "Você é um assistente pedagógico especializado em criar \
planos de aula lúdicos, adequados à faixa etária indicada e alinhados à BNCC \
(Base Nacional Comum Curricular).";

const TASKS: &str = r#"## Tarefas

1. Criar uma introdução lúdica que apresente o tema de forma criativa e engajadora.
2. Elaborar um passo a passo detalhado da atividade, com instruções claras e sequenciais que caibam na duração informada.
3. Gerar uma rubrica de avaliação com critérios objetivos que permitam ao professor avaliar o aprendizado.
4. Garantir que o objetivo de aprendizagem esteja alinhado à BNCC, citando o alinhamento.
"#;

const OUTPUT_CONTRACT: &str = r#"## Formato de saída

Responda somente com JSON válido, em um único bloco, exatamente com estas cinco chaves:

{
  "intro_ludica": "texto da introdução criativa e engajadora",
  "objetivo_bncc": "objetivo de aprendizagem alinhado à BNCC",
  "steps": "- Passo 1: ...\n- Passo 2: ...\n- Passo 3: ...",
  "evaluation_rubric": "Critério 1: ...\nCritério 2: ...\nCritério 3: ...",
  "mensagem_erro": null
}

- Se alguma variável estiver ausente, for inválida ou tornar a atividade inviável, preencha apenas "mensagem_erro" com a descrição do problema e deixe os outros quatro campos como null.
- Quando "mensagem_erro" for null, os outros quatro campos devem ser textos não vazios.
- Não inclua comentários nem texto fora do JSON; o JSON deve ser sempre parseável.
"#;

/// Build the instruction text for a validated payload.
pub fn compose(payload: &RequestPayload) -> ComposedPrompt {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(
        "Leia atentamente as variáveis abaixo e valide cada uma antes de gerar a saída.\n\n",
    );

    // Field values, sanitized before interpolation.
    prompt.push_str("## Variáveis\n\n");
    let fields = [
        ("Tema principal", payload.main_theme.as_str()),
        ("Tema secundário", payload.secondary_theme.as_str()),
        ("Matéria escolar", payload.subject.as_str()),
        ("Objetivo de aprendizagem", payload.objective.as_str()),
        ("Faixa etária ou série", payload.age_group.as_str()),
        ("Recursos disponíveis", payload.resources.as_str()),
    ];
    for (label, value) in fields {
        prompt.push_str(&format!("- {label}: {}\n", sanitize(value)));
    }
    prompt.push_str(&format!(
        "- Duração da atividade (minutos): {}\n\n",
        payload.duration_minutes
    ));

    prompt.push_str(TASKS);
    prompt.push('\n');
    prompt.push_str(OUTPUT_CONTRACT);

    ComposedPrompt {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        user_instruction: prompt,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
