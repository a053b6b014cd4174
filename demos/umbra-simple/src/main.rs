use smallvec::smallvec;

use umbra::attribute::{AttributeList, OwnedValue};
use umbra::filter::SeverityFilter;
use umbra::{Builder, Registry};

const CONFIG: &str = r#"{
  "root": [
    {
      "formatter": {
        "type": "string",
        "pattern": "{timestamp} {severity:<5s}: {message} [{...:{{name}={value}:p}{, :s}s}]",
        "severity": ["trace", "debug", "info", "warn", "error"]
      },
      "sinks": [{"type": "console", "target": "stdout"}]
    }
  ]
}"#;

fn main() {
  let registry = Registry::configured();
  let builder = Builder::from_json(&registry, CONFIG).expect("config parses");
  let logger = builder.build("root").expect("logger builds");

  logger.log(2, "application started");

  // Everything logged while the guard is alive carries the request id.
  let _scope = logger.scoped(smallvec![(
    "request".to_string(),
    OwnedValue::String("req-42".to_string())
  )]);

  let attributes: AttributeList = smallvec![("elapsed_ms", 17i64.into())];
  logger.log_with(2, "request handled", &attributes);

  // The supplier runs only if the record passes filtering.
  logger.log_lazy(3, "expensive details", &AttributeList::new(), || {
    format!("expensive details: {}", (0..5).sum::<i32>())
  });

  logger.filter(Box::new(SeverityFilter::new(4)));
  logger.log(2, "suppressed after the filter swap");
  logger.log(4, "still visible");
}
