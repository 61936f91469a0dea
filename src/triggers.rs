//! Keyword triggers: `#coffee`, `#tea` and friends.
//!
//! Every rule whose pattern matches a message fires once, in table order.
//! Built-in rules come first, then the ones from the config file.

use minijinja::Environment;
use rand::seq::IndexedRandom;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::TriggerConfig;
use crate::reply::{Reply, ReplyKind};
use crate::transport::ChatEvent;

#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("invalid trigger pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid template for trigger {pattern:?}: {source}")]
    Template {
        pattern: String,
        #[source]
        source: minijinja::Error,
    },
    #[error("trigger {pattern:?} has no template")]
    NoTemplate { pattern: String },
}

/// Values a trigger template can use.
#[derive(Debug, Serialize)]
pub struct TriggerContext<'a> {
    pub author: &'a str,
    pub channel: &'a str,
    pub nickname: &'a str,
}

const BUILTIN: &[(&str, &str)] = &[
    (r"#(kitten|cat)", "starts to meow at {{ author }}… *purr* *purr*"),
    (r"#dog", "rolls over, and wants its tummy scratched by {{ author }}"),
    (r"#champagne", "opens a nice chilled bottle of Moët & Chandon for {{ author }}"),
    (r"#beer", "$this->app['bartender']->setDrink('beer')->setTab('{{ author }}')->serveAll();"),
    (r"#coffee", "turns on the espresso machine for {{ author }}"),
    (r"#hotchocolate", "believes in miracles, {{ author }}, you sexy thing!"),
    (r"#tea", "has boiled some water, and begins to brew {{ author }} a nice cup of tea."),
    (r"#wine", "opens a bottle of Château Lafite at {{ author }}'s request!"),
    (r"#whisky", "pours a nip of Glenavon Special for {{ author }}."),
    (r"#whiskey", "takes a swig of Jameson, hands the bottle to {{ author }}, and sings - \"Whack fol de daddy-o, There's whiskey in the jar.\""),
    (r"#shiraz", "wonders if {{ author }} has ever had a Heathcote Estate Shiraz?"),
    (r"#rum", "grabs a bottle of rum, passes it to {{ author }} and starts singing pirate songs"),
    (r"#water", "pours water over {{ author }}…  That is what they wanted, right?"),
    (r"#(PR|pr|Pr|pR)", "gets the idea that Bopp should take care of {{ author }}'s pull requests or kittens may cry…"),
    (r"#vodka", "opens a bottle of Billionaire Vodka for {{ author }}.  It's good to be the king after all!"),
    (r"#koala", "passes some eucalyptus leaves to {{ author }}."),
    (r"#ninja", "visits http://{{ author }}.is-a-sneaky.ninja/"),
    (r"#upstream", "Maybe somebody screwed up somewhere... Perhaps {{ author }} knows what happened?"),
    (r"#popcorn", "yells: POPCORN! GET YOUR POPCORN!"),
    (r"#pastebin", "asks that http://pastebin.com/ be used for more than one-line messages. It makes life easier."),
    (r"#(pony|mylittlepony)", "says \"ZA̡͊͠͝LGΌ ISͮ̂҉̯͈͕̹̘̱ TO͇̹̺ͅƝ̴ȳ̳ TH̘Ë͖́̉ ͠P̯͍̭O̚​N̐Y̡ H̸̡̪̯ͨ͊̽̅̾̎Ȩ̬̩̾͛ͪ̈́̀́͘ ̶̧̨̱̹̭̯ͧ̾ͬC̷̙̲̝͖ͭ̏ͥͮ͟Oͮ͏̮̪̝͍M̲̖͊̒ͪͩͬ̚̚͜Ȇ̴̟̟͙̞ͩ͌͝S̨̥̫͎̭ͯ̿̔̀ͅ\""),
    (r"#tequila", "drinks one Tequila, two Tequilas, three Tequilas… floor!"),
    (r"#nicotine", "coughs and opens the windows…"),
    (r"OCD", "s/OCD/CDO/ …must be in alphabetical order…"),
    (r"#git", "says you have three choices: 1. man git, 2. nicely ask gawainlynch, or 3. do it the xkcd way: https://xkcd.com/1597/"),
    (r"#(BPFL|bpfl)", "exclaims loudly: 'All bow for our Benevolent Princess for Life, the Monarch of Australia, strangler of drop bears and catcher of koalas: gawainlynch!'"),
    (r"#(BDFL|bdfl|BoltBorn|Boltborn|boltborn)", "starts to sing: 'Boltborn, Boltborn, by his honor is sworn, to keep featurebloat forever at bay! And the fiercest foes rout when they hear our BDFL's shout, Boltborn, for your blessing we pray!'"),
    (r"#(KoalaBugs|Koalabugs)", "thinks he saw something small and furry scurry away from github. Somebody better check for #KoalaBugs..."),
    (r"#(http418|http 418)", "418 I'm a teapot"),
    (r"#(friday|Friday)", "assumes that {{ author }} will spend all weekend fixing bugs in Bolt, right?"),
    (r"#soup", "pours {{ author }} a nice warm bowl of soup"),
];

struct Rule {
    pattern: Regex,
    kind: ReplyKind,
    templates: Vec<String>,
}

/// The ordered rule table plus the template environment used to render it.
pub struct TriggerTable {
    rules: Vec<Rule>,
    env: Environment<'static>,
}

impl TriggerTable {
    /// Built-in rules only.
    pub fn builtin() -> Result<Self, TriggerError> {
        Self::new(&[])
    }

    /// Built-in rules followed by `configured`. Every pattern must compile and
    /// every template must parse.
    pub fn new(configured: &[TriggerConfig]) -> Result<Self, TriggerError> {
        let builtin = BUILTIN
            .iter()
            .map(|(pattern, template)| (pattern.to_string(), ReplyKind::Action, vec![template.to_string()]));
        let custom = configured
            .iter()
            .map(|t| (t.pattern.clone(), t.kind, t.all_templates()));

        let mut rules = Vec::new();
        for (pattern, kind, templates) in builtin.chain(custom) {
            rules.push(compile_rule(pattern, kind, templates)?);
        }
        Ok(Self { rules, env: Environment::new() })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Replies for every rule matching `event.text`, in table order.
    pub fn respond(&self, event: &ChatEvent, nickname: &str) -> Vec<Reply> {
        let ctx = TriggerContext {
            author: &event.author,
            channel: &event.channel,
            nickname,
        };
        let mut rng = rand::rng();
        let mut replies = Vec::new();
        for rule in &self.rules {
            if !rule.pattern.is_match(&event.text) {
                continue;
            }
            let Some(template) = rule.templates.choose(&mut rng) else {
                continue;
            };
            match self.env.render_str(template, &ctx) {
                Ok(text) => {
                    debug!(pattern = rule.pattern.as_str(), "trigger fired");
                    replies.push(Reply::new(rule.kind, text));
                }
                Err(e) => warn!(pattern = rule.pattern.as_str(), error = %e, "trigger template failed"),
            }
        }
        replies
    }
}

fn compile_rule(
    pattern: String,
    kind: ReplyKind,
    templates: Vec<String>,
) -> Result<Rule, TriggerError> {
    if templates.is_empty() {
        return Err(TriggerError::NoTemplate { pattern });
    }
    for template in &templates {
        if let Err(source) = check_template(template) {
            return Err(TriggerError::Template { pattern, source });
        }
    }
    let compiled = Regex::new(&pattern).map_err(|source| TriggerError::Pattern {
        pattern: pattern.clone(),
        source,
    })?;
    Ok(Rule { pattern: compiled, kind, templates })
}

fn check_template(source: &str) -> Result<(), minijinja::Error> {
    Environment::new().template_from_str(source).map(|_| ())
}
