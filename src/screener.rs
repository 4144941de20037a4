//! Lexical Screener — stage-one pattern match over three keyword families.
//!
//! Each family (crisis, grooming, violence) is an independently maintained
//! rule table compiled once at engine construction. Families are evaluated
//! independently of each other, so one message can hit several categories
//! at once. A miss in a family does not force that category to zero; the
//! scorer may still derive a (capped) confidence from features alone.

use regex::RegexBuilder;

use crate::error::GuardResult;
use crate::types::RiskCategory;

// ── Rule tables ─────────────────────────────────────────────────────────────
//
// Phrase-level patterns only. Bare high-frequency words ("die", "kill")
// never appear as standalone rules so that quoted lyrics or idioms do not
// trigger a lexical hit on their own.

pub struct LexicalRule {
    pub id: &'static str,
    pub pattern: &'static str,
}

macro_rules! rules {
    ($(($id:literal, $pattern:literal)),* $(,)?) => {
        &[$(LexicalRule { id: $id, pattern: $pattern }),*]
    };
}

const CRISIS_RULES: &[LexicalRule] = rules![
    // Explicit suicidal ideation
    ("crisis.kill_end_self", r"\b(kill|end)\w*\b.*\b(myself|my life)\b"),
    ("crisis.want_to_die", r"\b(want|going|gonna)\b.*\b(die|suicide|dead)\b"),
    ("crisis.suicide", r"\bsuicid(e|al)\b"),
    ("crisis.kill_myself", r"\bkill myself\b"),
    ("crisis.end_my_life", r"\bend my life\b"),
    ("crisis.end_it_all", r"\bend it all\b"),
    ("crisis.want_die", r"\bwant to die\b"),
    ("crisis.ending_it", r"\bending it\b"),
    ("crisis.take_my_life", r"\btake my life\b"),
    ("crisis.wish_dead", r"\bwish i (was|were) dead\b"),
    ("crisis.rather_dead", r"\brather be dead\b"),
    // Self-harm
    ("crisis.harm_self", r"\b(cut|hurt|harm)\w*\b.*\b(myself|self)\b"),
    ("crisis.self_harm", r"\bself.?harm\b"),
    ("crisis.hurt_myself", r"\bhurt myself\b"),
    ("crisis.cut_myself", r"\bcut myself\b"),
    // Hopelessness
    ("crisis.not_worth_living", r"\b(no|not)\b.*\b(worth|point)\b.*\b(living|anymore)\b"),
    ("crisis.cant_go_on", r"\b(can'?t|cannot)\b.*\b(go on|take it|do this)\b"),
    ("crisis.better_off", r"\bbetter off (dead|without me)\b"),
    ("crisis.no_point", r"\bno point\b"),
    ("crisis.no_reason_live", r"\bno reason to live\b"),
    ("crisis.worthless", r"\bworthless\b"),
    ("crisis.hopeless", r"\bhopeless\b"),
    ("crisis.nobody_cares", r"\b(nobody|no one)\b.*\b(cares|wants|loves)\b"),
    ("crisis.everyone_better", r"\beveryone\b.*\b(better off|hates)\b"),
    ("crisis.disappear", r"\bwant to disappear\b"),
    ("crisis.dont_want_be_here", r"\bdon'?t want to (live|exist|be here)\b"),
    ("crisis.tired_of_living", r"\btired of living\b"),
    ("crisis.give_up", r"\bgive up\b"),
    ("crisis.cant_continue", r"\bcan'?t go on\b"),
    ("crisis.no_future", r"\bno future\b"),
    ("crisis.no_hope", r"\bno hope\b"),
    ("crisis.dont_see_future", r"\bdon'?t see a future\b"),
    ("crisis.care_if_gone", r"\bcare if i'?m gone\b"),
    ("crisis.want_it_to_stop", r"\bwant it to stop\b"),
    ("crisis.pain_unbearable", r"\bpain\b.*\bunbearable\b"),
    ("crisis.unbearable", r"\bunbearable\b"),
    ("crisis.cant_take", r"\bcan'?t take\b"),
    ("crisis.life_meaningless", r"\blife is meaningless\b"),
    ("crisis.not_worth_it", r"\bnot worth living\b"),
    ("crisis.give_up_on_life", r"\bgive up on life\b"),
    ("crisis.sleep_forever", r"\bwant to sleep forever\b"),
    ("crisis.never_wake_up", r"\bnever wake up\b"),
    ("crisis.done_with_everything", r"\bdone with everything\b"),
    // Planning language
    ("crisis.how_to_die", r"\b(how to|ways to)\b.*\b(kill|die|suicide|end it)\b"),
    ("crisis.means_and_intent", r"\b(pills|gun|rope|bridge|knife)\b.*\b(die|suicide|end|myself)\b"),
    ("crisis.have_means", r"\bhave (a gun|a knife|pills)\b"),
    ("crisis.planning_end", r"\bplanning\b.*\b(end|die|suicide|kill)\b"),
    ("crisis.prepared_everything", r"\bprepared everything\b"),
    ("crisis.wrote_note", r"\bwrote\b.*\b(note|letter|goodbye)\b"),
    ("crisis.pills_easy_way", r"\bpills\b.*\b(easy|easiest|way)\b"),
    ("crisis.thought_about_ending", r"\bthought about ending\b"),
    ("crisis.been_planning", r"\bbeen planning\b"),
    // Goodbye language
    ("crisis.goodbye_world", r"\bgoodbye\b.*\b(world|everyone|all)\b"),
    ("crisis.final_goodbye", r"\bfinal goodbye\b"),
    ("crisis.this_is_goodbye", r"\bthis is (the end|goodbye)\b"),
];

const GROOMING_RULES: &[LexicalRule] = rules![
    // Age / identity probing
    ("grooming.age_probe", r"\b(how old|what age)\b.*\b(are you|r u|you)\b"),
    ("grooming.school_probe", r"\b(what|which)\b.*\b(school|grade)\b"),
    ("grooming.location_probe", r"\bwhere\b.*\b(live|from|located|stay)\b"),
    ("grooming.address_probe", r"\bwhat\b.*\b(address|location)\b"),
    ("grooming.identity_probe", r"\btell me\b.*\b(name|phone|where|about yourself)\b"),
    // Photo requests
    ("grooming.photo_request", r"\bsend\b.*\b(picture|photo|pic|selfie|image)\b"),
    ("grooming.show_me", r"\bshow me\b.*\b(picture|photo|yourself|you)\b"),
    ("grooming.see_photo", r"\b(can i|let me|want to)\b.*\b(see|have)\b.*\b(photo|picture|you)\b"),
    ("grooming.pic_of_you", r"\bpic of you\b"),
    ("grooming.selfie", r"\bselfie\b"),
    // Meetup attempts
    ("grooming.meet_up", r"\bmeet\b.*\b(up|irl|in person|real life|sometime)\b"),
    ("grooming.come_meet", r"\b(come|go)\b.*\b(meet|see)\b.*\b(me|you)\b"),
    ("grooming.pick_you_up", r"\bpick you up\b"),
    ("grooming.my_place", r"\bmy (car|place|house|apartment)\b"),
    ("grooming.come_to_my", r"\bcome to my\b"),
    ("grooming.come_over", r"\bcome over\b"),
    ("grooming.alone_together", r"\bhang out\b.*\b(alone|private)\b"),
    // Secrecy and manipulation
    ("grooming.dont_tell", r"\b(don'?t tell|keep .*(secret|between us|private))\b"),
    ("grooming.our_secret", r"\b(our|this)\b.*\b(secret|special|private)\b"),
    ("grooming.nobody_knows", r"\bnobody\b.*\b(needs to|has to|should) know\b"),
    ("grooming.between_us", r"\bjust between us\b"),
    ("grooming.little_secret", r"\bour little secret\b"),
    // Flattery
    ("grooming.flattery", r"\byou'?re\b.*\b(mature|pretty|hot|sexy|beautiful|cute)\b"),
    ("grooming.look_older", r"\byou look (older|mature|hot|sexy)\b"),
    ("grooming.so_mature", r"\bso (mature|pretty|beautiful|hot)\b"),
    ("grooming.age_number", r"\bage\b.*\b(just a number|doesn'?t matter)\b"),
    ("grooming.really_mature", r"\b(really|so) mature\b"),
    ("grooming.mature_for_age", r"\bmature for your age\b"),
    ("grooming.seem_older", r"\bseem\b.*\b(mature|older)\b"),
];

const VIOLENCE_RULES: &[LexicalRule] = rules![
    // Direct threats
    ("violence.threat_other", r"\b(kill|hurt|attack|harm)\b.*\b(them|him|her|someone|people|you)\b"),
    ("violence.going_to_hurt", r"\bi'?m (going to|gonna|will)\b.*\b(hurt|kill|attack)\b"),
    ("violence.intent_hurt", r"\bgoing to (hurt|kill|attack|harm)\b"),
    ("violence.want_to_hurt", r"\bwant to (hurt|kill|attack|harm)\b.*\b(them|him|her|someone)\b"),
    ("violence.deserve_die", r"\bthey\b.*\b(deserve|should|going to|will)\b.*\bdie\b"),
    ("violence.make_them_suffer", r"\b(make|watch)\b.*\b(them|him|her)\b.*\b(die|suffer|pay)\b"),
    // Weapons with intent
    ("violence.weapon_intent", r"\b(gun|knife|weapon|bomb)\b.*\b(kill|hurt|use|shoot|stab)\b"),
    ("violence.shoot_stab", r"\b(shoot|stab|blow up)\b"),
    ("violence.have_weapon", r"\bhave a (gun|knife|weapon)\b"),
    ("violence.bring_weapon", r"\bbring a (gun|knife|weapon)\b"),
    // Mass violence
    ("violence.shoot_up", r"\bshoot\b.*\b(up|school|place|everyone|them all)\b"),
    ("violence.mass_violence", r"\bmass\b.*\b(shooting|killing|murder)\b"),
    ("violence.kill_everyone", r"\b(kill|hurt|attack)\b.*\b(everyone|them all|all of them)\b"),
    ("violence.make_them_pay", r"\bmake them (pay|suffer|regret)\b"),
    ("violence.theyll_pay", r"\bthey'?ll\b.*\b(pay|regret|be sorry)\b"),
    // Specific or planned threats
    ("violence.know_where", r"\bi know where\b.*\b(live|work|go|are)\b"),
    ("violence.have_list", r"\bi have a (list|plan|target)\b"),
    ("violence.planning_attack", r"\bplanning\b.*\b(attack|hurt|kill|shoot)\b"),
    ("violence.wont_see_coming", r"\bwon'?t see\b.*\b(it coming|coming|it)\b"),
    ("violence.preparing_attack", r"\bpreparing\b.*\b(attack|weapons)\b"),
    ("violence.planned_this", r"\bplanned this\b"),
];

// ── Screener ────────────────────────────────────────────────────────────────

struct CompiledRule {
    id: &'static str,
    regex: regex::Regex,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryHits {
    pub hit: bool,
    pub matched_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ScreenReport {
    pub crisis: CategoryHits,
    pub grooming: CategoryHits,
    pub violence: CategoryHits,
}

impl ScreenReport {
    pub fn category(&self, category: RiskCategory) -> &CategoryHits {
        match category {
            RiskCategory::Crisis => &self.crisis,
            RiskCategory::Grooming => &self.grooming,
            RiskCategory::Violence => &self.violence,
        }
    }

    pub fn any_hit(&self) -> bool {
        self.crisis.hit || self.grooming.hit || self.violence.hit
    }
}

pub struct LexicalScreener {
    crisis: Vec<CompiledRule>,
    grooming: Vec<CompiledRule>,
    violence: Vec<CompiledRule>,
}

impl LexicalScreener {
    pub fn new() -> GuardResult<Self> {
        Ok(Self {
            crisis: Self::compile(CRISIS_RULES)?,
            grooming: Self::compile(GROOMING_RULES)?,
            violence: Self::compile(VIOLENCE_RULES)?,
        })
    }

    fn compile(rules: &[LexicalRule]) -> GuardResult<Vec<CompiledRule>> {
        rules
            .iter()
            .map(|rule| {
                let regex = RegexBuilder::new(rule.pattern)
                    .case_insensitive(true)
                    .build()?;
                Ok(CompiledRule { id: rule.id, regex })
            })
            .collect()
    }

    /// Evaluate all three families against the message content.
    pub fn screen(&self, content: &str) -> ScreenReport {
        ScreenReport {
            crisis: Self::screen_family(&self.crisis, content),
            grooming: Self::screen_family(&self.grooming, content),
            violence: Self::screen_family(&self.violence, content),
        }
    }

    fn screen_family(rules: &[CompiledRule], content: &str) -> CategoryHits {
        let matched: Vec<String> = rules
            .iter()
            .filter(|rule| rule.regex.is_match(content))
            .map(|rule| rule.id.to_string())
            .collect();
        CategoryHits {
            hit: !matched.is_empty(),
            matched_patterns: matched,
        }
    }

    pub fn rule_counts(&self) -> (usize, usize, usize) {
        (self.crisis.len(), self.grooming.len(), self.violence.len())
    }
}
