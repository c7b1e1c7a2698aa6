use nom::{
    character::complete::{alpha1, alphanumeric1, char, multispace0, multispace1},
    Finish,
    IResult,
    combinator::{all_consuming, map, opt, recognize},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    branch::alt,
    bytes::complete::tag,
};
use bauplan::{FieldDecl, RecordRef, TypeDesc};
use anyhow::{anyhow, bail, Result};
use log::warn;
use std::collections::HashSet;
use std::sync::Arc;

/// The type of a field as written in a schema file
#[derive(Debug, Clone, PartialEq)]
pub enum TypeName {
    Scalar(TypeDesc),
    Record(String),
    Reference(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordDef {
    pub name: String,
    pub fields: Vec<(String, TypeName)>,
}

/// A set of mutually referring record declarations:
///
/// ```text
/// record Node {
///     id: u32,
///     label: str,
///     next: &Node,
/// }
/// ```
#[derive(Debug)]
pub struct Schema {
    records: Vec<RecordDef>,
}

impl Schema {

    /// Looks up a record and hands out a descriptor whose fields are resolved lazily against the schema
    pub fn record(self: &Arc<Self>, name: &str) -> Result<RecordRef> {
        match self.find(name) {
            Some(_) => Ok(self.record_ref(name)),
            None => Err(anyhow!("Record {} is not declared in the schema", name)),
        }
    }

    pub fn records(&self) -> &[RecordDef] {
        &self.records
    }

    fn find(&self, name: &str) -> Option<&RecordDef> {
        self.records.iter().find(|r| r.name == name)
    }

    fn record_ref(self: &Arc<Self>, name: &str) -> RecordRef {
        let schema = self.clone();
        let owned = name.to_owned();
        RecordRef::named(name, move || schema.fields_of(&owned))
    }

    fn fields_of(self: &Arc<Self>, name: &str) -> Vec<FieldDecl> {
        let def = match self.find(name) {
            Some(def) => def,
            None => {
                warn!("record {} vanished from the schema, treating it as empty", name);
                return Vec::new();
            },
        };
        def.fields.iter().map(|(field, ty)| {
            let ty = match ty {
                TypeName::Scalar(desc) => desc.clone(),
                TypeName::Record(name) => TypeDesc::Record(self.record_ref(name)),
                TypeName::Reference(name) => TypeDesc::reference(self.record_ref(name)),
            };
            FieldDecl::new(field.as_str(), ty)
        }).collect()
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for record in &self.records {
            if !seen.insert(record.name.as_str()) {
                bail!("Record {} is declared twice", record.name);
            }
            let mut fields = HashSet::new();
            for (field, ty) in &record.fields {
                if !fields.insert(field.as_str()) {
                    bail!("Field {}.{} is declared twice", record.name, field);
                }
                match ty {
                    TypeName::Record(name) | TypeName::Reference(name) if self.find(name).is_none() =>
                        bail!("Field {}.{} refers to undeclared record {}", record.name, field, name),
                    _ => (),
                }
            }
        }
        Ok(())
    }

}

fn identifier(i: &str) -> IResult<&str, &str> {
    recognize(pair(alt((alpha1, tag("_"))), many0(alt((alphanumeric1, tag("_"))))))(i)
}

fn type_name(i: &str) -> IResult<&str, TypeName> {
    alt((
        map(preceded(pair(char('&'), multispace0), identifier), |n| TypeName::Reference(n.to_owned())),
        map(identifier, |n| match n {
            "bool"  => TypeName::Scalar(TypeDesc::Bool),
            "i8"    => TypeName::Scalar(TypeDesc::I8),
            "u8"    => TypeName::Scalar(TypeDesc::U8),
            "i16"   => TypeName::Scalar(TypeDesc::I16),
            "u16"   => TypeName::Scalar(TypeDesc::U16),
            "i32"   => TypeName::Scalar(TypeDesc::I32),
            "u32"   => TypeName::Scalar(TypeDesc::U32),
            "f32"   => TypeName::Scalar(TypeDesc::F32),
            "i64"   => TypeName::Scalar(TypeDesc::I64),
            "u64"   => TypeName::Scalar(TypeDesc::U64),
            "f64"   => TypeName::Scalar(TypeDesc::F64),
            "str"   => TypeName::Scalar(TypeDesc::Str),
            "bytes" => TypeName::Scalar(TypeDesc::bytes()),
            other   => TypeName::Record(other.to_owned()),
        }),
    ))(i)
}

fn field(i: &str) -> IResult<&str, (String, TypeName)> {
    map(
        separated_pair(
            delimited(multispace0, identifier, multispace0),
            char(':'),
            delimited(multispace0, type_name, multispace0)),
        |(name, ty)| (name.to_owned(), ty)
    )(i)
}

fn record(i: &str) -> IResult<&str, RecordDef> {
    map(
        tuple((
            preceded(tuple((multispace0, tag("record"), multispace1)), identifier),
            delimited(
                pair(multispace0, char('{')),
                terminated(separated_list0(char(','), field), opt(pair(char(','), multispace0))),
                tuple((multispace0, char('}'), multispace0))),
        )),
        |(name, fields)| RecordDef { name: name.to_owned(), fields }
    )(i)
}

pub fn parse(i: &str) -> Result<Arc<Schema>> {
    let records = all_consuming(terminated(many0(record), multispace0))(i).finish().map_err(|e| anyhow!("{}", e))?.1;
    let schema = Schema { records };
    schema.validate()?;
    Ok(Arc::new(schema))
}
