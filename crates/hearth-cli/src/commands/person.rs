use anyhow::Result;
use hearth_core::models::NewPersonData;
use hearth_core::repository::Repository;

use crate::cli::{PersonCommand, PersonSubcommand};
use crate::util::resolve_person;
use crate::views::table::display_people;

pub async fn person_command(repo: &impl Repository, command: PersonCommand) -> Result<()> {
    match command.command {
        PersonSubcommand::Add(add) => {
            let person = repo
                .add_person(NewPersonData {
                    name: add.name,
                    email: add.email,
                    photo_url: None,
                    color: add.color,
                })
                .await?;
            println!("Added person: '{}'", person.name);
        }
        PersonSubcommand::List => {
            let people = repo.find_people().await?;
            display_people(&people);
        }
        PersonSubcommand::Delete(arg) => {
            let person = resolve_person(repo, &arg.name).await?;
            repo.delete_person(person.id).await?;
            println!("Removed person: '{}'", person.name);
        }
    }
    Ok(())
}
