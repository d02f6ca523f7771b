// src/services/prompts.rs
use crate::language::Language;
use crate::message::{ChatMessage, MessageRole};
use crate::services::upstream::{CompletionRequest, ContentPart, ImageUrl, MessageContent, UpstreamMessage};

const CHAT_MAX_TOKENS: u32 = 800;
const CHAT_TEMPERATURE: f32 = 0.8;
const ANALYSIS_MAX_TOKENS: u32 = 1000;
const ANALYSIS_TEMPERATURE: f32 = 0.7;

fn doctor_persona(language: Language) -> &'static str {
    match language {
        Language::Ar => {
            "أنت طبيب نباتات خبير ومتخصص. مهمتك مساعدة المستخدمين في:
- تشخيص أمراض النباتات
- تقديم نصائح العناية بالنباتات
- الإجابة على أسئلة حول الزراعة والري والتسميد
- اقتراح حلول للمشاكل الزراعية

أجب دائماً باللغة العربية بشكل واضح ومفصل ومفيد."
        }
        Language::En => {
            "You are an expert plant doctor and specialist. Your role is to help users with:
- Diagnosing plant diseases
- Providing plant care advice
- Answering questions about cultivation, watering, and fertilization
- Suggesting solutions to agricultural problems

Always answer in English clearly, in detail, and helpfully."
        }
    }
}

fn analysis_instruction(language: Language) -> &'static str {
    match language {
        Language::Ar => {
            r#"قم بتحليل صورة النبات هذه وحدد:
1. نوع النبات (plantName)
2. الحالة الصحية (healthStatus): "Healthy" أو "Diseased"
3. اسم المرض إن وجد (diseaseName)
4. وصف تفصيلي (description)
5. الأعراض الظاهرة (symptoms) - قائمة
6. الأسباب المحتملة (causes) - قائمة
7. شدة الإصابة (severity): "low" أو "medium" أو "high" أو null
8. خطوات العلاج (treatment) - قائمة
9. نصائح الوقاية (prevention) - قائمة
10. نسبة الثقة (confidence) من 0 إلى 1

أرجع النتيجة بصيغة JSON فقط بدون أي نص إضافي:
{
  "plantName": "اسم النبات",
  "healthStatus": "Healthy أو Diseased",
  "diseaseName": "اسم المرض أو null",
  "description": "وصف تفصيلي",
  "symptoms": ["عرض 1", "عرض 2"],
  "causes": ["سبب 1", "سبب 2"],
  "severity": "low أو medium أو high أو null",
  "treatment": ["خطوة 1", "خطوة 2"],
  "prevention": ["نصيحة 1", "نصيحة 2"],
  "confidence": 0.95
}"#
        }
        Language::En => {
            r#"Analyze this plant image and identify:
1. Plant name (plantName)
2. Health status (healthStatus): "Healthy" or "Diseased"
3. Disease name if any (diseaseName)
4. Detailed description (description)
5. Visible symptoms (symptoms) - array
6. Likely causes (causes) - array
7. Severity (severity): "low", "medium", "high" or null
8. Treatment steps (treatment) - array
9. Prevention tips (prevention) - array
10. Confidence level (confidence) from 0 to 1

Return ONLY JSON format without any additional text:
{
  "plantName": "plant name",
  "healthStatus": "Healthy or Diseased",
  "diseaseName": "disease name or null",
  "description": "detailed description",
  "symptoms": ["symptom 1", "symptom 2"],
  "causes": ["cause 1", "cause 2"],
  "severity": "low, medium, high or null",
  "treatment": ["step 1", "step 2"],
  "prevention": ["tip 1", "tip 2"],
  "confidence": 0.95
}"#
        }
    }
}

/// System persona, then history in order, then the question.
pub fn chat_request(language: Language, history: &[ChatMessage], question: &str) -> CompletionRequest {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(UpstreamMessage::text("system", doctor_persona(language)));
    messages.extend(
        history
            .iter()
            .map(|m| UpstreamMessage::text(m.role.as_str(), m.text.clone())),
    );
    messages.push(UpstreamMessage::text(MessageRole::User.as_str(), question));

    CompletionRequest {
        messages,
        max_tokens: CHAT_MAX_TOKENS,
        temperature: CHAT_TEMPERATURE,
    }
}

/// `payload` must already be stripped of any data-URI prefix.
pub fn analysis_request(language: Language, payload: &str) -> CompletionRequest {
    let content = MessageContent::Parts(vec![
        ContentPart::Text {
            text: analysis_instruction(language).to_string(),
        },
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:image/jpeg;base64,{payload}"),
            },
        },
    ]);

    CompletionRequest {
        messages: vec![UpstreamMessage { role: "user", content }],
        max_tokens: ANALYSIS_MAX_TOKENS,
        temperature: ANALYSIS_TEMPERATURE,
    }
}

/// Trims the input and drops a leading `data:image/<type>;base64,` prefix.
pub fn strip_data_uri(input: &str) -> &str {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix("data:image/") else {
        return trimmed;
    };
    match rest.find(";base64,") {
        Some(idx) if !rest[..idx].is_empty() && !rest[..idx].contains(',') => {
            rest[idx + ";base64,".len()..].trim()
        }
        _ => trimmed,
    }
}
