//! Operations over lists of links: expansion of one declaration into links,
//! moot-link filtering, the update loop and grouping by destination.

use crate::file::{FileRef, Repo};
use crate::format::Formatter;
use crate::forge::FileStore;
use crate::link::{Link, Status};
use log::{error, info};
use std::fmt;

/// Expands one declaration into links.
///
/// With both sides given, every source is paired with every destination,
/// sources first. With one side empty, each file of the other side becomes a
/// link with a blank counterpart.
pub fn combine(froms: &[FileRef], tos: &[FileRef]) -> Vec<Link> {
    match (froms.is_empty(), tos.is_empty()) {
        (true, _) => tos
            .iter()
            .map(|to| Link::new(FileRef::default(), to.clone()))
            .collect(),
        (_, true) => froms
            .iter()
            .map(|from| Link::new(from.clone(), FileRef::default()))
            .collect(),
        _ => froms
            .iter()
            .flat_map(|from| tos.iter().map(move |to| Link::new(from.clone(), to.clone())))
            .collect(),
    }
}

/// Splits `links` into the ones to keep and the moot ones, both in their
/// original order.
pub fn filter(links: Vec<Link>) -> (Vec<Link>, Vec<Link>) {
    links.into_iter().partition(|link| !link.is_moot())
}

/// Brings every link up to date on `head`, recording each outcome in its
/// status. A failing link never stops the loop.
///
/// Returns whether at least one link was updated.
pub fn update_all<S: FileStore + ?Sized>(
    links: &mut [Link],
    store: &S,
    formatter: &Formatter,
    head: &str,
) -> bool {
    let mut updated = false;

    for link in links.iter_mut() {
        link.status = match link.need_update(store, head) {
            Err(e) => {
                error!("Failed to check if {} needs update: {}", link, e);
                Status::FailedToCheck
            }
            Ok(false) => {
                info!("Update not needed for {}", link);
                Status::UpdateNotNeeded
            }
            Ok(true) => match link.update(store, formatter, head) {
                Err(e) => {
                    error!("Failed to update {}: {}", link, e);
                    Status::FailedToUpdate
                }
                Ok(_) => {
                    updated = true;
                    Status::Updated
                }
            },
        };
    }

    updated
}

/// Links partitioned by destination repository, keyed by `owner/repo`.
///
/// Groups are kept in the order their repository first appears, and each
/// group keeps the order of its links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkGroups {
    groups: Vec<LinkGroup>,
}

/// The links targeting one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkGroup {
    pub repo: Repo,
    pub links: Vec<Link>,
}

impl LinkGroups {
    pub fn new(links: &[Link]) -> Self {
        let mut groups: Vec<LinkGroup> = Vec::new();

        for link in links {
            let key = link.to.repo.key();
            match groups.iter_mut().find(|g| g.repo.key() == key) {
                Some(group) => group.links.push(link.clone()),
                None => groups.push(LinkGroup {
                    repo: link.to.repo.clone(),
                    links: vec![link.clone()],
                }),
            }
        }

        Self { groups }
    }

    pub fn get(&self, key: &str) -> Option<&[Link]> {
        self.groups
            .iter()
            .find(|g| g.repo.key() == key)
            .map(|g| g.links.as_slice())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkGroup> {
        self.groups.iter()
    }
}

impl IntoIterator for LinkGroups {
    type Item = LinkGroup;
    type IntoIter = std::vec::IntoIter<LinkGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

impl fmt::Display for LinkGroups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.groups {
            writeln!(f, "Group {:?}:", group.repo.key())?;
            for link in &group.links {
                writeln!(f, "\t{}", link)?;
            }
        }
        Ok(())
    }
}
