//! 助手知识库：静态的“关键词 -> 回答”表，与检测引擎无共享逻辑
//!
//! 匹配规则：问题转小写后，凡是任一关键词作为子串出现，就收录该条回答（按表顺序）。
//! 会话记录（`Transcript`）以问候语开头，有界，由 `history::ChatStore` 持久化。
use serde::{Deserialize, Serialize};

/// 知识条目
#[derive(Debug, Clone, Copy)]
pub struct KnowledgeEntry {
    pub keywords: &'static [&'static str],
    pub response: &'static str,
}

pub const GREETING: &str = "Hello! I'm Cyra, your CryptoFinder AI Assistant. I can help you understand cryptographic algorithms, firmware security, and best practices. What would you like to know?";

pub const DEFAULT_RESPONSE: &str = "That's an interesting question! For specific guidance on cryptographic implementations, I recommend consulting security documentation or analyzing your firmware with our tool. I specialize in common algorithms like AES, RSA, SHA, ECC, and general security best practices.";

pub const KNOWLEDGE_BASE: &[KnowledgeEntry] = &[
    KnowledgeEntry {
        keywords: &["aes", "advanced encryption standard"],
        response: "AES (Advanced Encryption Standard) is a symmetric encryption algorithm widely used for secure data transmission. AES-256 uses a 256-bit key and is considered highly secure for most applications. It's fast, efficient, and approved by the NSA for top-secret information.",
    },
    KnowledgeEntry {
        keywords: &["rsa"],
        response: "RSA is an asymmetric cryptographic algorithm used for secure data transmission and digital signatures. RSA-2048 is currently considered secure, though RSA-4096 is recommended for long-term security. It uses public and private key pairs for encryption and decryption.",
    },
    KnowledgeEntry {
        keywords: &["sha", "secure hash"],
        response: "SHA (Secure Hash Algorithm) is a family of cryptographic hash functions. SHA-1 is now considered weak and deprecated. SHA-256 and SHA-3 are currently recommended for secure applications. Hash functions are one-way functions used for data integrity verification.",
    },
    KnowledgeEntry {
        keywords: &["ecc", "elliptic curve"],
        response: "ECC (Elliptic Curve Cryptography) provides the same level of security as RSA but with smaller key sizes, making it more efficient. ECC-256 is equivalent to RSA-3072 in terms of security. It's widely used in modern applications and mobile devices.",
    },
    KnowledgeEntry {
        keywords: &["firmware", "iot", "embedded"],
        response: "Firmware security is critical for IoT and embedded devices. Key concerns include: using strong encryption (AES-256), secure boot processes, regular updates, avoiding deprecated algorithms (MD5, SHA-1, DES), and implementing proper authentication mechanisms.",
    },
    KnowledgeEntry {
        keywords: &["md5"],
        response: "MD5 is a cryptographic hash function that is now considered broken and unsuitable for security purposes. It has known collision vulnerabilities where two different inputs can produce the same hash. Use SHA-256 or SHA-3 instead for secure hashing operations.",
    },
    KnowledgeEntry {
        keywords: &["des", "data encryption standard"],
        response: "DES (Data Encryption Standard) is an obsolete encryption algorithm that uses a 56-bit key, which is too short by modern standards. It can be broken in hours with modern computing power. Use AES instead. 3DES is slightly better but still being phased out.",
    },
    KnowledgeEntry {
        keywords: &["encryption", "cipher"],
        response: "Modern encryption algorithms include: AES (symmetric), RSA/ECC (asymmetric), and ChaCha20 (stream cipher). For hashing, use SHA-256 or SHA-3. Always use well-established algorithms and avoid creating custom cryptography.",
    },
    KnowledgeEntry {
        keywords: &["hello", "hi", "hey", "greetings"],
        response: "Hello! I'm here to help you understand cryptographic concepts and firmware security. Feel free to ask me about AES, RSA, SHA, ECC, or any other security-related questions!",
    },
    KnowledgeEntry {
        keywords: &["help", "what can you do"],
        response: "I can help you with:\n• Cryptographic algorithms (AES, RSA, SHA, ECC, etc.)\n• Firmware security best practices\n• Algorithm strength assessment\n• Encryption vs hashing\n• Security recommendations\n• Vulnerability analysis\n\nJust ask me anything about cryptography or security!",
    },
    KnowledgeEntry {
        keywords: &["weak", "vulnerable", "insecure"],
        response: "Weak or deprecated algorithms include: MD5, SHA-1, DES, RC4, and RSA-1024. These should be avoided in production systems. Replace them with: SHA-256/SHA-3 for hashing, AES-256 for symmetric encryption, and RSA-2048/4096 or ECC for asymmetric encryption.",
    },
    KnowledgeEntry {
        keywords: &["strong", "secure", "safe", "recommended"],
        response: "Strong, currently recommended algorithms include: AES-256 for symmetric encryption, RSA-2048/4096 or ECC-256+ for asymmetric encryption, and SHA-256/SHA-3 for hashing. Always use well-tested libraries and keep them updated.",
    },
];

/// 回答一个问题；没有任何关键词命中时返回默认回答
pub fn respond(question: &str) -> Vec<&'static str> {
    let q = question.to_lowercase();
    let mut out: Vec<&'static str> = KNOWLEDGE_BASE
        .iter()
        .filter(|entry| entry.keywords.iter().any(|k| q.contains(k)))
        .map(|entry| entry.response)
        .collect();
    if out.is_empty() {
        out.push(DEFAULT_RESPONSE);
    }
    out
}

/// 会话记录容量（消息条数）
pub const CHAT_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// 有界会话记录，按时间先后排列；超出容量时丢弃最早的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self { messages: vec![ChatMessage { role: ChatRole::Assistant, content: GREETING.to_string() }] }
    }
}

impl Transcript {
    /// 新会话，只含问候语
    pub fn new() -> Self {
        Self::default()
    }

    /// 由外部加载的消息构建；空列表视为新会话
    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        if messages.is_empty() {
            return Self::new();
        }
        let mut t = Self { messages };
        t.trim();
        t
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// 记录一轮问答；多条回答以空行拼成一条消息，返回该消息
    pub fn ask(&mut self, question: &str) -> &str {
        let answer = respond(question).join("\n\n");
        self.messages.push(ChatMessage { role: ChatRole::User, content: question.to_string() });
        self.messages.push(ChatMessage { role: ChatRole::Assistant, content: answer });
        self.trim();
        self.messages.last().map(|m| m.content.as_str()).unwrap_or_default()
    }

    fn trim(&mut self) {
        if self.messages.len() > CHAT_CAPACITY {
            let excess = self.messages.len() - CHAT_CAPACITY;
            self.messages.drain(..excess);
        }
    }
}
